pub mod candidate;
pub mod comparison;
pub mod disposition;
pub mod invoice;
pub mod po;
pub mod summary;

pub use candidate::CandidateRecord;
pub use comparison::{ComparisonSlot, FieldComparison};
pub use disposition::{Approval, Disposition};
pub use invoice::{InvoiceDoc, InvoiceLine};
pub use po::{POLine, PROCESSED};
pub use summary::RunSummary;
