pub mod error;
pub mod report;
pub mod timefmt;

pub use error::{PersistError, ReportError};
pub use report::{
    present, AdditionalInformation, EmailIncident, Person, ReportDocument, SourceCapture,
    UploadedFile, WebpageIncident,
};
