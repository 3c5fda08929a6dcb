/// Hook a solver calls after every iteration.
///
/// Returning `Some(action)` asks the solver to act on the event, for example
/// to stop early. `None` lets the iteration continue.
pub trait Observer<E, A> {
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

/// Ignores every event.
impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}

/// Records the iteration history without steering the solver.
impl<E: Clone, A> Observer<E, A> for &mut Vec<E> {
    fn observe(&mut self, event: &E) -> Option<A> {
        self.push(event.clone());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_collects_events_in_order() {
        let mut history = Vec::new();
        let mut observer = &mut history;
        for event in [3, 1, 2] {
            let action: Option<()> = observer.observe(&event);
            assert!(action.is_none());
        }
        assert_eq!(history, [3, 1, 2]);
    }
}
