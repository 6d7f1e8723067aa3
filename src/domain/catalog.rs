use std::collections::HashMap;

/// How often an action may be credited for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Once per calendar day, tracked on the user record itself
    /// (the recurring daily bonus).
    OnceDaily,
    /// Up to `cap` completions per calendar day, tracked via
    /// completion events.
    RateLimited { cap: u32 },
}

#[derive(Debug, Clone)]
pub struct Action {
    pub id: String,
    /// Coins credited per completion. Always positive.
    pub payout_coins: i64,
    pub kind: ActionKind,
}

impl Action {
    pub fn daily_cap(&self) -> u32 {
        match self.kind {
            ActionKind::OnceDaily => 1,
            ActionKind::RateLimited { cap } => cap,
        }
    }
}

/// Static catalog of reward actions. Read-only at runtime; the engine
/// looks actions up but never defines or mutates them.
pub struct ActionCatalog {
    actions: HashMap<String, Action>,
}

impl ActionCatalog {
    pub fn new(actions: Vec<Action>) -> Self {
        let actions = actions.into_iter().map(|a| (a.id.clone(), a)).collect();
        Self { actions }
    }

    /// The default task table shipped with the app.
    pub fn builtin() -> Self {
        let action = |id: &str, payout_coins: i64, kind: ActionKind| Action {
            id: id.to_string(),
            payout_coins,
            kind,
        };
        Self::new(vec![
            action("daily_bonus", 200, ActionKind::OnceDaily),
            action("quick_click", 10, ActionKind::RateLimited { cap: 100 }),
            action("view_offer", 50, ActionKind::RateLimited { cap: 10 }),
            action("follow_social", 100, ActionKind::RateLimited { cap: 5 }),
            action("comment_video", 75, ActionKind::RateLimited { cap: 8 }),
            action("install_app", 500, ActionKind::RateLimited { cap: 3 }),
        ])
    }

    pub fn get(&self, action_id: &str) -> Option<&Action> {
        self.actions.get(action_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_daily_bonus_is_once_per_day() {
        let catalog = ActionCatalog::builtin();
        let bonus = catalog.get("daily_bonus").unwrap();
        assert_eq!(bonus.payout_coins, 200);
        assert_eq!(bonus.kind, ActionKind::OnceDaily);
        assert_eq!(bonus.daily_cap(), 1);
    }

    #[test]
    fn unknown_action_is_a_miss() {
        assert!(ActionCatalog::builtin().get("T99").is_none());
    }
}
