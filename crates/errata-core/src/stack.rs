/// Symbols of the capture machinery and of the report path itself. They
/// never describe the caller, so they are dropped before `skip` applies.
const INTERNAL_PREFIXES: &[&str] = &[
    "backtrace::",
    "errata_core::stack::capture_stack",
    "errata_core::stack::walk",
    "errata_core::collector::Collector",
    "errata_core::report::",
];

/// Rendered name for a frame whose symbol cannot be resolved.
const UNKNOWN_FUNCTION: &str = "<unknown>";

/// Accepts resolved symbols innermost first and keeps the ones that describe
/// the caller, until `max_frames` are held.
struct FrameSink {
    skip: usize,
    max_frames: usize,
    frames: Vec<String>,
}

impl FrameSink {
    fn new(skip: usize, max_frames: usize) -> Self {
        Self {
            skip,
            max_frames,
            frames: Vec::with_capacity(max_frames),
        }
    }

    fn is_full(&self) -> bool {
        self.frames.len() >= self.max_frames
    }

    fn offer(&mut self, function: &str, location: Option<String>) {
        if self.is_full() || INTERNAL_PREFIXES.iter().any(|p| function.starts_with(p)) {
            return;
        }
        if self.skip > 0 {
            self.skip -= 1;
            return;
        }
        self.frames.push(match location {
            Some(loc) => format!("{function} @ {loc}"),
            None => function.to_string(),
        });
    }

    /// Outermost first, so the last entry is closest to the caller.
    fn into_frames(self) -> Vec<String> {
        let mut frames = self.frames;
        frames.reverse();
        frames
    }
}

/// Capture the current call stack as `"function @ file:line"` strings,
/// ordered outermost first so the last entry is closest to the caller.
///
/// Internal frames are dropped, then `skip` more. The walk stops as soon as
/// `max_frames` frames are kept, and only walked frames are symbolized, so
/// the cost does not grow with stack depth. Returns an empty list when the
/// platform cannot walk the stack; never panics.
#[inline(never)]
pub fn capture_stack(skip: usize, max_frames: usize) -> Vec<String> {
    walk(skip, max_frames).0
}

/// The kept frames and the number of physical frames visited.
fn walk(skip: usize, max_frames: usize) -> (Vec<String>, usize) {
    if max_frames == 0 {
        return (Vec::new(), 0);
    }
    let mut sink = FrameSink::new(skip, max_frames);
    let mut visited = 0;
    backtrace::trace(|frame| {
        visited += 1;
        let mut resolved = false;
        backtrace::resolve_frame(frame, |symbol| {
            resolved = true;
            let function = symbol
                .name()
                .map(|name| format!("{name:#}"))
                .unwrap_or_else(|| UNKNOWN_FUNCTION.to_string());
            let location = match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(line)) => Some(format!("{}:{line}", file.display())),
                (Some(file), None) => Some(file.display().to_string()),
                _ => None,
            };
            sink.offer(&function, location);
        });
        if !resolved {
            sink.offer(UNKNOWN_FUNCTION, None);
        }
        !sink.is_full()
    });
    if visited == 0 {
        tracing::warn!("stack capture unavailable on this platform");
    }
    (sink.into_frames(), visited)
}
