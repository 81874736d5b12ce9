//! Error formatting helpers for stable assertions.

use std::error::Error;

/// Join an error with each of its sources, outermost first, separated by
/// `": "`.
///
/// `stepbind` errors wrap handler and factory failures as sources, so this
/// is how tests check the user-supplied message survived.
pub fn display_error_chain(err: &(dyn Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("outer")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn joins_sources() {
        let err = Outer(std::io::Error::other("inner"));
        assert_eq!(display_error_chain(&err), "outer: inner");
    }
}
