pub mod attachment;
pub mod edit;
pub mod ids;
pub mod options;
pub mod record;
pub mod state;

pub use attachment::{Attachment, MediaType};
pub use edit::{FieldEdit, FieldName, TextField};
pub use ids::{AttachmentId, PreviewId};
pub use options::{ChoiceSet, FormOptions};
pub use record::SubmittedRecord;
pub use state::{FormState, MultiChoice};
