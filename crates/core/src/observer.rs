/// A hook the problem builder calls when it makes a decision on the
/// caller's behalf.
///
/// The builder describes each decision with an event `E`, for example a
/// constraint about to move to the linear group. Returning `None` accepts the
/// decision. Returning `Some(action)` asks for something else, such as
/// failing the registration instead.
///
/// Any `FnMut(&E) -> Option<A>` closure is an observer. `()` is the observer
/// used when none is given; it accepts everything.
pub trait Observer<E, A> {
    /// Called once per event, before the builder acts on it.
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

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
