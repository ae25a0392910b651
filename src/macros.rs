//! Small macros shared by the rest of the crate.

/// Join path components with `/`, e.g. `dir!("~", "bbhashbench")`. Intended for remote paths,
/// which are plain strings rather than local `Path`s.
macro_rules! dir {
    ($first:expr $(, $part:expr)* $(,)?) => {{
        let mut path = String::from($first);
        $(
            if !path.ends_with('/') {
                path.push('/');
            }
            path.push_str($part);
        )*
        path
    }};
}

/// Evaluate `$expr`, recording how long it took under `$label` in the `$timers` vector. Evaluates
/// to the value of `$expr`.
macro_rules! time {
    ($timers:ident, $label:expr, $expr:expr) => {{
        let start = std::time::Instant::now();
        let result = $expr;
        $timers.push(($label, start.elapsed()));
        result
    }};
}
