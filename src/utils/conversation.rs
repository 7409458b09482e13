use uuid::Uuid;

/// Derives the identifier shared by every message in a thread.
///
/// The two participant ids are sorted before joining, so the result is the
/// same no matter which side sends first. A project-scoped thread between
/// the same pair gets its own id by appending the project id. Both the send
/// and lookup paths must call this with the same inputs.
pub fn conversation_id(user_a: Uuid, user_b: Uuid, project_id: Option<Uuid>) -> String {
    let mut ids = [user_a.to_string(), user_b.to_string()];
    ids.sort();

    match project_id {
        Some(project) => format!("{}-{}-{}", ids[0], ids[1], project),
        None => format!("{}-{}", ids[0], ids[1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_in_participants() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let project = Uuid::new_v4();

        assert_eq!(conversation_id(a, b, None), conversation_id(b, a, None));
        assert_eq!(
            conversation_id(a, b, Some(project)),
            conversation_id(b, a, Some(project))
        );
    }

    #[test]
    fn project_scope_separates_threads() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();

        let general = conversation_id(a, b, None);
        let scoped_one = conversation_id(a, b, Some(p1));
        let scoped_two = conversation_id(a, b, Some(p2));

        assert_ne!(general, scoped_one);
        assert_ne!(general, scoped_two);
        assert_ne!(scoped_one, scoped_two);
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let a = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let b = Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap();

        assert_eq!(
            conversation_id(b, a, None),
            "11111111-1111-1111-1111-111111111111-22222222-2222-2222-2222-222222222222"
        );
    }
}
