//! Board-level permission checks
//!
//! Every service operation that touches a board resolves the acting user's
//! membership through [`AuthorizationGate`] before it mutates anything. The
//! board is always taken from the loaded entity (a column's `board_id`, a
//! task's column's `board_id`), never from caller input.
//!
//! # Permission Model
//!
//! 1. **Membership**: the user must hold a `board_members` row
//! 2. **Role**: the row's [`BoardRole`] must reach the permission's minimum
//!
//! | Permission      | Minimum role |
//! |-----------------|--------------|
//! | `Read`          | viewer       |
//! | `Write`         | editor       |
//! | `ManageMembers` | editor       |
//!
//! # Example
//!
//! ```no_run
//! use kanban_core::auth::authorization::{AuthorizationGate, BoardPermission};
//! use kanban_core::repository::memory::MemoryStore;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example(board_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let gate = AuthorizationGate::new(Arc::new(MemoryStore::new()));
//! let role = gate.require(board_id, user_id, BoardPermission::Write).await?;
//! println!("acting as {}", role);
//! # Ok(())
//! # }
//! ```

use crate::error::RepoError;
use crate::models::board_member::BoardRole;
use crate::repository::BoardMemberRepository;
use std::sync::Arc;
use uuid::Uuid;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User has no membership on the board
    #[error("Not a member of board {0}")]
    NotMember(Uuid),

    /// User's role is below the permission's minimum
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole {
        required: BoardRole,
        actual: BoardRole,
    },

    /// Membership lookup failed
    #[error("Repository error: {0}")]
    Repository(#[from] RepoError),
}

/// Permission types for board operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardPermission {
    /// List and get boards, columns, tasks and members (Viewer+)
    Read,

    /// Create, update, move and delete (Editor+)
    Write,

    /// Invite and remove members (Editor+)
    ManageMembers,
}

impl BoardPermission {
    /// Gets the minimum role required for this permission
    pub fn min_role(&self) -> BoardRole {
        match self {
            BoardPermission::Read => BoardRole::Viewer,
            BoardPermission::Write => BoardRole::Editor,
            BoardPermission::ManageMembers => BoardRole::Editor,
        }
    }
}

/// Outcome of resolving a user's standing on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Member(BoardRole),
    NotAMember,
}

impl Access {
    /// True if this access satisfies `permission`
    pub fn allows(&self, permission: BoardPermission) -> bool {
        match self {
            Access::Member(role) => role.has_permission(&permission.min_role()),
            Access::NotAMember => false,
        }
    }
}

/// Resolves memberships and enforces board permissions
#[derive(Clone)]
pub struct AuthorizationGate {
    members: Arc<dyn BoardMemberRepository>,
}

impl AuthorizationGate {
    pub fn new(members: Arc<dyn BoardMemberRepository>) -> Self {
        Self { members }
    }

    /// Looks up the user's role on the board
    pub async fn resolve_role(&self, board_id: Uuid, user_id: Uuid) -> Result<Access, RepoError> {
        let access = match self.members.get_role(board_id, user_id).await? {
            Some(role) => Access::Member(role),
            None => Access::NotAMember,
        };
        Ok(access)
    }

    /// Checks that the user holds `permission` on the board
    ///
    /// # Returns
    ///
    /// The user's role, so callers can apply finer rules on top
    ///
    /// # Errors
    ///
    /// - `NotMember` if the user has no membership
    /// - `InsufficientRole` if the role is below the permission's minimum
    /// - `Repository` if the lookup itself failed
    pub async fn require(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        permission: BoardPermission,
    ) -> Result<BoardRole, AuthzError> {
        let access = self.resolve_role(board_id, user_id).await?;
        let role = match access {
            Access::Member(role) => role,
            Access::NotAMember => {
                tracing::warn!(
                    board_id = %board_id,
                    user_id = %user_id,
                    ?permission,
                    "Access denied: not a board member"
                );
                return Err(AuthzError::NotMember(board_id));
            }
        };

        if !access.allows(permission) {
            let required = permission.min_role();
            tracing::warn!(
                board_id = %board_id,
                user_id = %user_id,
                role = %role,
                required = %required,
                "Access denied: insufficient role"
            );
            return Err(AuthzError::InsufficientRole {
                required,
                actual: role,
            });
        }

        Ok(role)
    }
}
