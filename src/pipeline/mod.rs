//! Pipeline stages for batch document-to-Markdown conversion.
//!
//! Each submodule owns exactly one concern, and every conversion engine sits
//! behind a trait so tests (and library users) can substitute their own.
//!
//! ## Data Flow
//!
//! ```text
//! walk ──▶ primary ──▶ fallback ──▶ ocr ──▶ primary ──▶ fallback
//!          (any file)  (PDF only)   (PDF)   (OCR'd PDF) (OCR'd PDF)
//! ```
//!
//! 1. [`walk`]     — enumerate candidate files under the root
//! 2. [`primary`]  — generic converter, first attempt for every file
//! 3. [`fallback`] — pdfium text extraction, shaped by [`postprocess`]
//! 4. [`ocr`]      — produce a searchable PDF, then retry 2 and 3 on it
//!
//! The ordering and skip rules live in [`crate::convert`]; the stages here
//! know nothing about each other.

pub mod fallback;
pub mod ocr;
pub mod postprocess;
pub mod primary;
pub mod tool;
pub mod walk;
