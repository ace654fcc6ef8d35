//! Pipeline stages for PDF-to-table extraction.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and engines can be swapped behind their traits.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ocr ──▶ llm ──▶ postprocess ──▶ aggregate
//! (bytes)   (pdfium)   (tess)  (model)  (cleanup)       (table)
//! ```
//!
//! 1. [`input`]     — load a path or URL into a [`input::Document`]
//! 2. [`render`]    — rasterise every page to JPEG; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`encode`]    — JPEG encode/decode of page images
//! 4. [`ocr`]       — OCR each page and join texts in page order
//! 5. [`llm`]       — prompt the model with text + schema, deterministic
//!    mode, optional bounded retry
//! 6. [`postprocess`] — strip code fences and invisible characters from
//!    the model's answer
//! 7. [`aggregate`] — parse JSON, flatten to records, build the table

pub mod aggregate;
pub mod encode;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod postprocess;
pub mod render;
