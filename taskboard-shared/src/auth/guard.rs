/// Ownership authorization guard
///
/// A pure decision function over (actor, resource ownership, action). It
/// performs no I/O and never mutates state; callers load the resource
/// first (missing resources are a not-found, checked before authorization)
/// and then consult the guard with the ownership facts they already hold.
///
/// # Rules
///
/// | Resource | Action        | Rule                                       |
/// |----------|---------------|--------------------------------------------|
/// | Project  | create, read  | always allowed                             |
/// | Project  | update, delete| actor must be the project owner            |
/// | Task     | create        | actor must own the parent project          |
/// | Task     | read          | always allowed                             |
/// | Task     | update, delete| actor is project owner OR current assignee |
///
/// Status changes on a task follow the task update rule.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::guard::{project_action, task_action, Action, Decision};
///
/// // Only the owner may delete a project
/// assert_eq!(project_action(1, 1, Action::Delete), Decision::Allow);
/// assert_eq!(project_action(2, 1, Action::Delete), Decision::Deny);
///
/// // The assignee may update a task they don't own
/// assert_eq!(task_action(7, 1, Some(7), Action::Update), Decision::Allow);
/// ```

/// Action an actor wants to perform on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

/// Guard verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Error type for denied actions
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// Actor may not act on this resource
    #[error("Not authorized to act on this resource")]
    Denied,
}

/// Decides whether `actor_id` may perform `action` on a project
///
/// Creation is always allowed (the actor becomes the owner); reads carry
/// no ownership restriction; mutation requires ownership.
pub fn project_action(actor_id: i64, project_owner_id: i64, action: Action) -> Decision {
    match action {
        Action::Create | Action::Read => Decision::Allow,
        Action::Update | Action::Delete => {
            if actor_id == project_owner_id {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
    }
}

/// Decides whether `actor_id` may perform `action` on a task
///
/// `project_owner_id` is the owner of the task's parent project and
/// `assigned_to` the task's current assignee, if any. Task creation is
/// owner-only; mutation is open to the owner or the assignee.
pub fn task_action(
    actor_id: i64,
    project_owner_id: i64,
    assigned_to: Option<i64>,
    action: Action,
) -> Decision {
    match action {
        Action::Read => Decision::Allow,
        Action::Create => {
            if actor_id == project_owner_id {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        Action::Update | Action::Delete => {
            if actor_id == project_owner_id || assigned_to == Some(actor_id) {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
    }
}

/// Converts a guard decision into a result
///
/// Services call this directly after loading the resource, so every
/// endpoint maps Deny to the same error.
pub fn require_allowed(decision: Decision) -> Result<(), GuardError> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(GuardError::Denied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_create_and_read_open_to_all() {
        assert_eq!(project_action(42, 1, Action::Create), Decision::Allow);
        assert_eq!(project_action(42, 1, Action::Read), Decision::Allow);
    }

    #[test]
    fn test_project_mutation_owner_only() {
        assert_eq!(project_action(1, 1, Action::Update), Decision::Allow);
        assert_eq!(project_action(1, 1, Action::Delete), Decision::Allow);

        assert_eq!(project_action(2, 1, Action::Update), Decision::Deny);
        assert_eq!(project_action(2, 1, Action::Delete), Decision::Deny);
    }

    #[test]
    fn test_task_create_requires_project_ownership() {
        assert_eq!(task_action(1, 1, None, Action::Create), Decision::Allow);
        assert_eq!(task_action(2, 1, None, Action::Create), Decision::Deny);

        // Being the assignee does not grant create on the project
        assert_eq!(task_action(7, 1, Some(7), Action::Create), Decision::Deny);
    }

    #[test]
    fn test_task_read_open_to_all() {
        assert_eq!(task_action(99, 1, Some(7), Action::Read), Decision::Allow);
    }

    #[test]
    fn test_task_mutation_owner_or_assignee() {
        // Project owner
        assert_eq!(task_action(1, 1, Some(7), Action::Update), Decision::Allow);
        assert_eq!(task_action(1, 1, None, Action::Delete), Decision::Allow);

        // Current assignee
        assert_eq!(task_action(7, 1, Some(7), Action::Update), Decision::Allow);
        assert_eq!(task_action(7, 1, Some(7), Action::Delete), Decision::Allow);

        // Neither
        assert_eq!(task_action(9, 1, Some(7), Action::Update), Decision::Deny);
        assert_eq!(task_action(9, 1, None, Action::Delete), Decision::Deny);

        // Unassigned task, non-owner actor
        assert_eq!(task_action(7, 1, None, Action::Update), Decision::Deny);
    }

    #[test]
    fn test_require_allowed() {
        assert!(require_allowed(Decision::Allow).is_ok());
        assert!(matches!(
            require_allowed(Decision::Deny),
            Err(GuardError::Denied)
        ));
    }
}
