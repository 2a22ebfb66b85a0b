//! # docfill
//!
//! Template-filling engine for office documents. A template, either a flow
//! document (`.docx`) or a slide deck (`.pptx`), carries `{NAME}`
//! placeholder tokens in its text; the engine discovers those tokens and
//! substitutes them with text, images or tabular data while leaving the
//! rest of the document structure untouched.
//!
//! The two operations are used in sequence: a caller scans a template to
//! learn which placeholders it contains (typically to build an input form),
//! then supplies values and fills it.
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::path::Path;
//! use docfill::{extract_placeholders, fill_template, UploadedFile};
//!
//! let template = Path::new("offer.docx");
//! let names = extract_placeholders(template)?;
//! println!("placeholders: {:?}", names);
//!
//! let mut text_inputs = HashMap::new();
//! text_inputs.insert("CUSTOMER_NAME".to_string(), "Ada".to_string());
//! let mut file_inputs = HashMap::new();
//! file_inputs.insert(
//!     "PRICING".to_string(),
//!     UploadedFile::new("pricing.xlsx", std::fs::read("pricing.xlsx")?),
//! );
//!
//! fill_template(template, &file_inputs, &text_inputs, Path::new("offer-ada.docx"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Substitution is flat and literal: no conditionals, loops or nested
//! scopes, just `{NAME}` tokens. How a file binding is applied follows from
//! its filename ([`ContentKind`]): images become inline pictures at a fixed
//! display width, spreadsheets become tables, text-bearing files contribute
//! their extracted text. A payload that fails to parse degrades to an
//! inline error marker at its placeholder instead of failing the whole
//! operation.

mod content;
mod docx;
mod error;
mod extract;
mod fill;
mod ooxml;
mod pptx;
mod scan;
mod xlsx;

pub use content::{ContentKind, TemplateKind, UploadedFile};
pub use docx::Document;
pub use error::{FillError, Result};
pub use extract::extract_text;
pub use fill::fill_template;
pub use pptx::Presentation;
pub use scan::extract_placeholders;
pub use xlsx::SheetTable;
