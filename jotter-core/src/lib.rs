//! jotter-core: task model, natural-language normalization and the todo store

pub mod fuzzy_date;
pub mod normalizer;
pub mod password;
pub mod store;
pub mod task;
pub mod time;

pub use fuzzy_date::{parse_fuzzy_date, DateParser};
pub use normalizer::{
    build_prompt, parse_response, ExtractedFields, GenerationError, NormalizeError,
    TaskNormalizer, TextGenerator,
};
pub use password::{hash_password, verify_password};
pub use store::{NewUser, Store, User};
pub use task::{Category, Priority, StructuredTask, Todo};
pub use time::{parse_timezone, reference_date, reference_date_in};
