//! Access control for search and view
//!
//! The service asks an [`Authorizer`] before touching the filesystem or
//! spawning anything. Hosts bring their own; the CLI uses [`AllowList`].

/// Decides whether an actor may use the search surface
pub trait Authorizer {
    /// `actor` is `None` for anonymous callers
    fn is_allowed(&self, actor: Option<&str>) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(Option<&str>) -> bool,
{
    fn is_allowed(&self, actor: Option<&str>) -> bool {
        self(actor)
    }
}

/// Named actors that may search. An empty list admits everyone, including
/// anonymous callers.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    actors: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actors: actors
                .into_iter()
                .map(Into::into)
                .map(|a: String| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.actors.is_empty()
    }
}

impl Authorizer for AllowList {
    fn is_allowed(&self, actor: Option<&str>) -> bool {
        if self.is_open() {
            return true;
        }
        match actor {
            Some(actor) => self.actors.iter().any(|a| a == actor),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_allow_list_admits_everyone() {
        let list = AllowList::default();
        assert!(list.is_open());
        assert!(list.is_allowed(None));
        assert!(list.is_allowed(Some("anyone")));
    }

    #[test]
    fn test_allow_list_matches_exactly() {
        let list = AllowList::new(["admin", " ops "]);
        assert!(list.is_allowed(Some("admin")));
        assert!(list.is_allowed(Some("ops")));
        assert!(!list.is_allowed(Some("Admin")));
        assert!(!list.is_allowed(Some("guest")));
        assert!(!list.is_allowed(None));
    }

    #[test]
    fn test_allow_list_ignores_blank_entries() {
        let list = AllowList::new(["", "  "]);
        assert!(list.is_open());
    }

    #[test]
    fn test_closure_authorizer() {
        let deny_all = |_: Option<&str>| false;
        assert!(!deny_all.is_allowed(Some("admin")));

        let signed_in = |actor: Option<&str>| actor.is_some();
        assert!(signed_in.is_allowed(Some("x")));
        assert!(!signed_in.is_allowed(None));
    }
}
