use super::common::*;
use crate::gateway::{ReplyOutcome, UserId};
use crate::workflows::membership::service::EntryGate;
use crate::workflows::membership::store::{ApplicationStore, StoreError};
use crate::workflows::membership::MembershipError;

#[tokio::test]
async fn gate_blocks_existing_role_holders() {
    let (service, gateway, store) = build_service();
    let member = UserId(1);
    gateway.role_holders.lock().unwrap().insert(member);

    let gate = service.gate(member).await.expect("gate check");
    assert_eq!(gate, EntryGate::AlreadyMember);

    let ephemerals = gateway.ephemerals.lock().unwrap();
    assert!(ephemerals
        .iter()
        .any(|(user, text)| *user == member && text.contains("already hold")));
    assert!(store.fetch(&member).expect("fetch").is_none(), "no record created");
}

#[tokio::test]
async fn gate_opens_for_new_candidates() {
    let (service, _gateway, _store) = build_service();
    let gate = service.gate(UserId(2)).await.expect("gate check");
    assert_eq!(gate, EntryGate::Open);
}

#[tokio::test]
async fn submit_rejects_blank_fields() {
    let (service, _gateway, store) = build_service();
    let mut responses = form();
    responses.age = "   ".to_string();

    match service.submit(UserId(3), responses).await {
        Err(MembershipError::IncompleteForm(missing)) => assert_eq!(missing, vec!["age"]),
        other => panic!("expected incomplete form error, got {other:?}"),
    }
    assert!(store.fetch(&UserId(3)).expect("fetch").is_none());
}

#[tokio::test]
async fn submit_acknowledges_ephemerally() {
    let (service, gateway, _store) = build_service();
    let applicant = UserId(4);

    service.submit(applicant, form()).await.expect("submitted");

    let ephemerals = gateway.ephemerals.lock().unwrap();
    assert!(ephemerals
        .iter()
        .any(|(user, text)| *user == applicant && text.contains("private messages")));
}

#[tokio::test]
async fn failed_staff_handoff_closes_the_application() {
    let (service, gateway, store) = build_service();
    let applicant = UserId(7);
    gateway.queue_reply(ReplyOutcome::Answered("against".to_string()));
    gateway.queue_reply(ReplyOutcome::Answered("a friend".to_string()));
    service.submit(applicant, form()).await.expect("submitted");
    *gateway.fail_posts.lock().unwrap() = true;

    let result = service.run_interview(applicant).await;
    assert!(matches!(result, Err(MembershipError::Gateway(_))));

    assert!(store.fetch(&applicant).expect("fetch").is_none(), "record closed out");
    {
        let ephemerals = gateway.ephemerals.lock().unwrap();
        assert!(ephemerals
            .iter()
            .any(|(user, text)| *user == applicant && text.contains("apply again")));
    }

    // The applicant is free to try again once the channel recovers.
    *gateway.fail_posts.lock().unwrap() = false;
    service
        .submit(applicant, form())
        .await
        .expect("re-application accepted");
}

#[tokio::test]
async fn duplicate_submission_is_rejected_while_active() {
    let (service, gateway, _store) = build_service();
    let applicant = UserId(5);

    service.submit(applicant, form()).await.expect("first submission");
    match service.submit(applicant, form()).await {
        Err(MembershipError::Store(StoreError::Conflict)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }

    let ephemerals = gateway.ephemerals.lock().unwrap();
    assert!(ephemerals
        .iter()
        .any(|(user, text)| *user == applicant && text.contains("in progress")));
}
