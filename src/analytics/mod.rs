//! Pure derivations over fetched order and user lists. Nothing here performs
//! I/O or fails: malformed fields are coerced at the model boundary and
//! records without usable dates are skipped where a date is required.

pub mod dates;
pub mod range;
pub mod search;
pub mod sort;
pub mod status;
pub mod summary;
