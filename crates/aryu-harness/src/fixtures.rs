//! Session and payload fixtures shared by tests.

use std::collections::BTreeSet;

use aryu_core::{LoginType, SessionContext, UserProfile};
use aryu_proto::QuizQuestion;

/// Session for a user of the given portal with no extra permissions.
pub fn session(login_type: LoginType) -> SessionContext {
    SessionContext {
        token: "sim-token".into(),
        login_type,
        user: UserProfile { id: 7, name: Some("Sim User".into()), permissions: BTreeSet::new() },
    }
}

/// Administrator session. May start quiz questions.
pub fn admin() -> SessionContext {
    session(LoginType::Admin)
}

/// Student session. May not start quiz questions.
pub fn student() -> SessionContext {
    session(LoginType::Student)
}

/// Question with a fixed countdown.
pub fn question(index: usize, duration_secs: u32) -> QuizQuestion {
    QuizQuestion {
        index,
        id: Some(index as u64 + 100),
        prompt: format!("Question {}", index + 1),
        options: vec!["A".into(), "B".into(), "C".into()],
        duration_secs: Some(duration_secs),
    }
}
