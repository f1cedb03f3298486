use std::error::Error as StdError;

use http::Request;

use crate::types::{HttpContext, Severity};

/// A report assembled piece by piece, submitted with
/// [`Collector::submit`](crate::Collector::submit).
///
/// ```
/// use errata_core::{Collector, ErrorReport, Severity};
///
/// let collector = Collector::new();
/// let err = std::io::Error::other("disk full");
/// collector.submit(
///     ErrorReport::new(&err)
///         .severity(Severity::Warning)
///         .key("std::io::error::Error@disk"),
/// );
/// assert_eq!(collector.total_count("std::io::error::Error@disk"), Some(1));
/// ```
pub struct ErrorReport<'a> {
    pub(crate) err: &'a (dyn StdError + 'static),
    pub(crate) type_name: Option<&'static str>,
    pub(crate) severity: Severity,
    pub(crate) http_context: Option<HttpContext>,
    pub(crate) key: Option<String>,
}

impl<'a> ErrorReport<'a> {
    pub fn new<E: StdError + 'static>(err: &'a E) -> Self {
        Self {
            err,
            type_name: Some(std::any::type_name::<E>()),
            severity: Severity::default(),
            http_context: None,
            key: None,
        }
    }

    /// Report through a trait object. The class then comes from the
    /// describer's fallback, since the concrete type is not known: common
    /// std errors keep their type name, others use the leading identifier of
    /// their `Debug` output, which for enums is the variant name. Pass an
    /// explicit [`key`](Self::key) when that is too coarse to group by.
    pub fn from_dyn(err: &'a (dyn StdError + 'static)) -> Self {
        Self {
            err,
            type_name: None,
            severity: Severity::default(),
            http_context: None,
            key: None,
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn http_context(mut self, http_context: HttpContext) -> Self {
        self.http_context = Some(http_context);
        self
    }

    /// Attach method, URL and headers of a live request; its body is not read.
    pub fn http_request<B>(self, req: &Request<B>) -> Self {
        self.http_context(HttpContext::from_request(req))
    }

    /// Group under `key` instead of the derived key. By convention keys look
    /// like `<class>@<discriminator>`.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}
