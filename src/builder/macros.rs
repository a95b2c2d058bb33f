//! Macros for declaring state graphs.

/// Build a [`StateGraph`](crate::core::StateGraph) from a compact
/// `state => { event: target, ... }` listing.
///
/// States with an empty block are terminal.
///
/// # Example
///
/// ```
/// use rewind::state_graph;
///
/// let graph = state_graph! {
///     idle => { start: countdown, edit: idle },
///     countdown => { tick: countdown, finish: ringing, stop: idle },
///     ringing => { stop: idle },
/// };
///
/// assert_eq!(graph.target("countdown", "finish"), Some("ringing"));
/// assert_eq!(graph.len(), 3);
/// ```
#[macro_export]
macro_rules! state_graph {
    (
        $(
            $state:ident => { $($event:ident : $target:ident),* $(,)? }
        ),* $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut graph = $crate::core::StateGraph::new();
        $(
            graph.insert_state(stringify!($state));
            $(
                graph.insert_transition(
                    stringify!($state),
                    stringify!($event),
                    stringify!($target),
                );
            )*
        )*
        graph
    }};
}
