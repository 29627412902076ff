use crate::session::Session;

/// Mutable state shared by console commands.
///
/// - `session`: the robot, its obstacles and history.
/// - `should_exit`: a flag that the REPL loop checks to know when to terminate.
pub struct Environment {
    pub session: Session,
    pub should_exit: bool,
}

impl Environment {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            should_exit: false,
        }
    }
}
