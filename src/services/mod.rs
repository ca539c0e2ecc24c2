pub mod draft_store;
pub mod editor_form;
pub mod split_planner;
pub mod validation;

pub use draft_store::{ConfirmGate, DraftStore, MAX_QUESTIONS};
pub use editor_form::{EditorForm, FormInput};
pub use split_planner::{plan, SplitMode, SplitRequest};
pub use validation::ValidationState;
