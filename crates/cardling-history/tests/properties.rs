mod common;

use cardling_history::{DEFAULT_HISTORY_LIMIT, HistoryManager};
use common::{ScriptedEngine, snap};
use proptest::prelude::*;

fn recorded(count: usize) -> (std::sync::Arc<ScriptedEngine>, HistoryManager) {
    let engine = ScriptedEngine::new();
    let history = HistoryManager::new(engine.clone()).unwrap();
    for n in 1..=count {
        engine.show(snap(n));
        history.record().unwrap();
    }
    (engine, history)
}

proptest! {
    #[test]
    fn undo_stack_is_bounded(count in 0usize..120) {
        let (_engine, history) = recorded(count);
        prop_assert_eq!(history.undo_len(), count.min(DEFAULT_HISTORY_LIMIT));
        prop_assert_eq!(history.redo_len(), 0);
        prop_assert_eq!(history.current(), snap(count));
    }

    #[test]
    fn undo_then_redo_walks_back_and_forth(k in 1usize..=DEFAULT_HISTORY_LIMIT) {
        let (engine, history) = recorded(k);
        tokio_test::block_on(async {
            for i in 1..=k {
                assert!(history.undo().await.unwrap());
                assert_eq!(history.current(), snap(k - i));
                assert_eq!(engine.scene(), snap(k - i));
            }
            assert!(!history.can_undo());
            assert_eq!(history.redo_len(), k);

            for i in 1..=k {
                assert!(history.redo().await.unwrap());
                assert_eq!(history.current(), snap(i));
            }
        });
        prop_assert_eq!(history.current(), snap(k));
        prop_assert_eq!(history.undo_len(), k);
        prop_assert!(!history.can_redo());
    }
}

#[test]
fn fifty_first_edit_evicts_the_oldest() {
    let (_engine, history) = recorded(51);
    let undo = history.undo_snapshots();
    assert_eq!(undo.len(), 50);
    assert!(!undo.contains(&snap(0)));
    assert_eq!(undo.first(), Some(&snap(1)));
    assert_eq!(undo.last(), Some(&snap(50)));
}
