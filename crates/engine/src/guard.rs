use std::fmt;

/// The outcome of one guard for one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    /// Cancel the action. The reason, if any, is shown to the acting player.
    Deny(Option<String>),
}

impl Verdict {
    pub fn deny(reason: impl Into<String>) -> Self {
        Verdict::Deny(Some(reason.into()))
    }

    /// Cancel without telling the player anything.
    pub fn silent_deny() -> Self {
        Verdict::Deny(None)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Verdict::Deny(_))
    }
}

/// A guard: given a "before" signal, allow it or deny it.
///
/// Guards must run to completion synchronously; the host needs the verdict
/// before the action takes effect.
pub type Guard<S> = Box<dyn Fn(&S) -> Verdict + Send + Sync>;

/// An ordered collection of guards for one signal category.
///
/// Every guard is consulted in registration order and the results are merged
/// with "deny wins": the first denial is the verdict, otherwise the signal is
/// allowed.
pub struct GuardSet<S> {
    guards: Vec<Guard<S>>,
}

impl<S> GuardSet<S> {
    pub fn new() -> Self {
        Self { guards: Vec::new() }
    }

    pub fn add(&mut self, guard: impl Fn(&S) -> Verdict + Send + Sync + 'static) {
        self.guards.push(Box::new(guard));
    }

    pub fn evaluate(&self, signal: &S) -> Verdict {
        self.guards
            .iter()
            .map(|guard| guard(signal))
            .find(Verdict::is_denied)
            .unwrap_or(Verdict::Allow)
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl<S> Default for GuardSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for GuardSet<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardSet").field("guards", &self.guards.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_allows() {
        let set: GuardSet<i32> = GuardSet::new();
        assert_eq!(set.evaluate(&1), Verdict::Allow);
    }

    #[test]
    fn first_denial_wins() {
        let mut set: GuardSet<i32> = GuardSet::new();
        set.add(|_| Verdict::Allow);
        set.add(|n| if *n > 10 { Verdict::deny("too big") } else { Verdict::Allow });
        set.add(|n| if *n > 5 { Verdict::deny("too big-ish") } else { Verdict::Allow });

        assert_eq!(set.evaluate(&3), Verdict::Allow);
        assert_eq!(set.evaluate(&7), Verdict::deny("too big-ish"));
        assert_eq!(set.evaluate(&20), Verdict::deny("too big"));
        assert_eq!(set.len(), 3);
    }
}
