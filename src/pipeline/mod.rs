//! Pipeline stages for PDF-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and swappable.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ encode ──▶ client ──▶ batch
//! (pdfium /   (base64    (remote    (grouping, ordering,
//!  page cache) data URL)  call +     output sink)
//!                         backoff)
//! ```
//!
//! 1. [`source`] — lazily rasterise pages (or replay the on-disk page cache);
//!    pdfium work runs in `spawn_blocking` because it is not async-safe
//! 2. [`encode`] — encode each page image as a base64 data URL for the
//!    multimodal request body
//! 3. [`client`] — one remote transcription call per page, with unbounded
//!    exponential backoff on rate limits; the only stage with network I/O
//! 4. [`batch`]  — drive fixed-size groups of concurrent calls and write
//!    fragments to the sink in page order

pub mod batch;
pub mod client;
pub mod encode;
pub mod source;
