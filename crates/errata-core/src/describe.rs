use std::error::Error as StdError;

use crate::types::ErrorInstance;

/// Deepest `source()` chain followed when building causes.
pub const MAX_CAUSE_DEPTH: usize = 16;

/// Class used when neither a type name nor a Debug prefix is available.
pub const UNKNOWN_CLASS: &str = "unknown";

/// Message and class extracted from an error value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub message: String,
    pub class: String,
}

/// Maps an error value to its message and class.
///
/// `type_name` is the static type of the reported value when the caller
/// reported a concrete type, and `None` for trait objects and causes.
pub trait Describe: Send + Sync {
    fn describe(
        &self,
        err: &(dyn StdError + 'static),
        type_name: Option<&'static str>,
    ) -> Description;
}

/// `Display` text as message, the static type name (or the leading
/// identifier of the `Debug` output) as class.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDescriber;

impl Describe for DefaultDescriber {
    fn describe(
        &self,
        err: &(dyn StdError + 'static),
        type_name: Option<&'static str>,
    ) -> Description {
        let class = match type_name.or_else(|| known_type_name(err)) {
            Some(name) => name.to_string(),
            None => debug_class(err),
        };
        Description {
            message: err.to_string(),
            class,
        }
    }
}

impl<F> Describe for F
where
    F: Fn(&(dyn StdError + 'static), Option<&'static str>) -> Description + Send + Sync,
{
    fn describe(
        &self,
        err: &(dyn StdError + 'static),
        type_name: Option<&'static str>,
    ) -> Description {
        self(err, type_name)
    }
}

/// Type name of common std errors behind a trait object. Their Debug output
/// starts with an enum variant (`Os`, `Custom`, `Kind`), not the type.
fn known_type_name(err: &(dyn StdError + 'static)) -> Option<&'static str> {
    macro_rules! known {
        ($($ty:ty),* $(,)?) => {
            $(
                if err.is::<$ty>() {
                    return Some(std::any::type_name::<$ty>());
                }
            )*
        };
    }
    known!(
        std::io::Error,
        std::num::ParseIntError,
        std::num::ParseFloatError,
        std::num::TryFromIntError,
        std::str::Utf8Error,
        std::string::FromUtf8Error,
        std::fmt::Error,
        serde_json::Error,
    );
    None
}

/// Leading path-like identifier of the Debug rendering, e.g. `Timeout` for
/// `Timeout { after: 5s }`.
///
/// For enum errors this is the variant name, so distinct enums with a
/// same-named variant (say `Io(..)`) share a class.
fn debug_class(err: &(dyn StdError + 'static)) -> String {
    let rendered = format!("{err:?}");
    let ident: String = rendered
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    if ident.is_empty() {
        UNKNOWN_CLASS.to_string()
    } else {
        ident
    }
}

/// Build an `ErrorInstance` for `err`, following its `source()` chain.
/// Only the outermost instance carries `stacktrace`.
pub fn instance_from_error(
    describer: &dyn Describe,
    err: &(dyn StdError + 'static),
    type_name: Option<&'static str>,
    stacktrace: Vec<String>,
) -> ErrorInstance {
    let Description { message, class } = describer.describe(err, type_name);
    ErrorInstance {
        message,
        class,
        stacktrace,
        cause: cause_chain(describer, err.source(), MAX_CAUSE_DEPTH),
    }
}

fn cause_chain(
    describer: &dyn Describe,
    source: Option<&(dyn StdError + 'static)>,
    depth: usize,
) -> Option<Box<ErrorInstance>> {
    let source = source?;
    if depth == 0 {
        return None;
    }
    let Description { message, class } = describer.describe(source, None);
    Some(Box::new(ErrorInstance {
        message,
        class,
        stacktrace: Vec::new(),
        cause: cause_chain(describer, source.source(), depth - 1),
    }))
}
