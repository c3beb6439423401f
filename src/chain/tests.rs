use super::*;
use crate::dispatch::{ErrorDispatcher, NotFound, Status};
use crate::store::{Store, Value};
use crate::writer::{self, ResponseWriter};
use http::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn store() -> (Store, ResponseWriter) {
    let w = ResponseWriter::new();
    (Store::new().with_value(Value::ResponseWriter(w.clone())), w)
}

fn counting(
    counter: &Arc<AtomicUsize>,
) -> impl Fn(&mut Store) -> anyhow::Result<()> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |_store: &mut Store| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_all_handlers_run_in_order() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let (a, b) = (Arc::clone(&order), Arc::clone(&order));
    let chain = HandlerChain::builder()
        .then(move |_: &mut Store| {
            a.lock().unwrap().push(1);
            Ok(())
        })
        .then(move |_: &mut Store| {
            b.lock().unwrap().push(2);
            Ok(())
        })
        .build();
    let (s, w) = store();
    let outcome = chain.run(s, &ErrorDispatcher::default());
    assert!(outcome.is_completed());
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    assert!(!w.is_written());
    assert_eq!(
        chain.names().collect::<Vec<_>>(),
        ["handler-0", "handler-1"]
    );
}

#[test]
fn test_short_circuit_on_first_error() {
    let before = Arc::new(AtomicUsize::new(0));
    let after = Arc::new(AtomicUsize::new(0));
    let chain = HandlerChain::builder()
        .handler("before", counting(&before))
        .handler("fail", |_: &mut Store| Err(NotFound.into()))
        .handler("after", counting(&after))
        .build();

    let (s, w) = store();
    let outcome = chain.run(s, &ErrorDispatcher::default());
    match &outcome {
        ChainOutcome::Failed { index, code, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(*code, Some(StatusCode::NOT_FOUND));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(before.load(Ordering::SeqCst), 1);
    assert_eq!(after.load(Ordering::SeqCst), 0);
    assert_eq!(w.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(outcome.store().code(), StatusCode::NOT_FOUND);
}

#[test]
fn test_set_code_is_visible_to_dispatcher() {
    let chain = HandlerChain::builder()
        .handler("mark", |s: &mut Store| {
            s.set_code(StatusCode::CONFLICT);
            Ok(())
        })
        .handler("fail", |_: &mut Store| {
            Err(Status(StatusCode::BAD_REQUEST).into())
        })
        .build();
    let (s, w) = store();
    let outcome = chain.run(s, &ErrorDispatcher::default());
    assert_eq!(outcome.dispatched_code(), Some(StatusCode::CONFLICT));
    assert_eq!(w.status(), Some(StatusCode::CONFLICT));
    assert_eq!(&w.body()[..], b"Bad Request");
}

#[test]
fn test_panic_becomes_500() {
    let chain = HandlerChain::single("explode", |_: &mut Store| -> anyhow::Result<()> {
        panic!("kaboom")
    });
    let (s, w) = store();
    let outcome = chain.run(s, &ErrorDispatcher::default());
    match outcome {
        ChainOutcome::Failed { error, code, .. } => {
            let p = error.downcast_ref::<Panicked>().unwrap();
            assert_eq!(p.handler, "explode");
            assert_eq!(p.message, "kaboom");
            assert_eq!(code, Some(StatusCode::INTERNAL_SERVER_ERROR));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(w.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[test]
fn test_cancelled_before_next_handler() {
    let ran = Arc::new(AtomicUsize::new(0));
    let chain = HandlerChain::builder()
        .handler("abort", |s: &mut Store| {
            if let Some(w) = s.writer() {
                w.abort();
            }
            Ok(())
        })
        .handler("never", counting(&ran))
        .build();
    let (s, _w) = store();
    let outcome = chain.run(s, &ErrorDispatcher::default());
    assert!(matches!(outcome, ChainOutcome::Cancelled { index: 1, .. }));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn test_write_after_abort_is_an_error() {
    let chain = HandlerChain::single("late", |s: &mut Store| {
        if let Some(w) = s.writer() {
            w.abort();
        }
        writer::text(s, StatusCode::OK, "too late")?;
        Ok(())
    });
    let (s, w) = store();
    let outcome = chain.run(s, &ErrorDispatcher::default());
    assert!(matches!(outcome, ChainOutcome::Failed { index: 0, .. }));
    assert_eq!(w.status(), None);
}

#[test]
fn test_empty_chain_completes() {
    let chain = HandlerChain::builder().build();
    assert!(chain.is_empty());
    let (s, _) = store();
    assert!(chain.run(s, &ErrorDispatcher::default()).is_completed());
}

#[test]
fn test_chain_clone_shares_handlers() {
    let hits = Arc::new(AtomicUsize::new(0));
    let chain = HandlerChain::single("count", counting(&hits));
    let copy = chain.clone();
    copy.run(Store::new(), &ErrorDispatcher::default());
    chain.run(Store::new(), &ErrorDispatcher::default());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(copy.len(), 1);
}
