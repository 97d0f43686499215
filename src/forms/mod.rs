// Forms - field definitions, validation and the dynamic form interpreter

pub mod field;
pub mod interpreter;
pub mod location;
pub mod validator;

pub use field::{FieldDefinition, FieldKind, SelectOption, ValidationRules};
pub use interpreter::{ChangeReducer, DynamicForm, FormState, FormSubmitter, FormValues};
pub use location::{GeoPoint, LocationMode, LocationValue};
pub use validator::{validate, Validity};
