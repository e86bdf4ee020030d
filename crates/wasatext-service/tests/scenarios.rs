//! End-to-end flows through the public service API.

use tempfile::TempDir;
use wasatext_service::{
    ConversationService, ErrorKind, LoginOutcome, OutgoingMessage, ServiceConfig, ServiceError,
};
use wasatext_shared::{ChatId, UserId, ValidationError};
use wasatext_store::{Chats, DeliveryState, Messages};

fn setup() -> (ConversationService, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        database_path: Some(dir.path().join("wasatext.db")),
        ..ServiceConfig::default()
    };
    (ConversationService::open(&config).unwrap(), dir)
}

struct Trio {
    chat: ChatId,
    a: LoginOutcome,
    b: LoginOutcome,
    c: LoginOutcome,
}

fn trio(service: &ConversationService) -> Trio {
    let a = service.login("alice").unwrap();
    let b = service.login("bob").unwrap();
    let c = service.login("carol").unwrap();
    let chat = service
        .new_chat(&a.security_key, &[a.user_id, b.user_id, c.user_id])
        .unwrap();
    Trio { chat, a, b, c }
}

#[test]
fn private_chat_between_two_new_users() {
    let (service, _dir) = setup();

    let alice = service.login("alice").unwrap();
    let bob = service.login("bob").unwrap();
    assert!(alice.created && bob.created);
    assert_ne!(alice.user_id, bob.user_id);
    assert_ne!(alice.security_key, bob.security_key);

    let chat = service
        .new_chat(&alice.security_key, &[alice.user_id, bob.user_id])
        .unwrap();
    let conv = service.conversation(&alice.security_key, chat).unwrap();
    assert!(!conv.chat.is_group);
    assert_eq!(conv.chat.name, "Chat between alice and bob");
    assert_eq!(conv.members.len(), 2);
}

#[test]
fn group_send_creates_pending_row_per_member() {
    let (service, _dir) = setup();
    let t = trio(&service);

    let msg = service
        .send_message(&t.a.security_key, t.chat, &OutgoingMessage::text("hi"))
        .unwrap();

    let rows = service.message_statuses(&t.a.security_key, msg).unwrap();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert!(!row.sent && !row.seen);
        assert_eq!(row.comment, "");
    }

    service.mark_seen(&t.b.security_key, msg).unwrap();

    let rows = service.message_statuses(&t.a.security_key, msg).unwrap();
    for row in &rows {
        if row.user_id == t.b.user_id {
            assert!(row.seen);
        } else {
            assert!(row.user_id == t.a.user_id || row.user_id == t.c.user_id);
            assert_eq!(row.state(), DeliveryState::Pending);
        }
    }
}

#[test]
fn non_member_send_is_forbidden_and_leaves_no_message() {
    let (service, _dir) = setup();
    let t = trio(&service);
    let dave = service.login("dave").unwrap();

    let err = service
        .send_message(&dave.security_key, t.chat, &OutgoingMessage::text("let me in"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let conn = service.database().conn().unwrap();
    assert!(Messages::new(&conn).list_by_chat(t.chat).unwrap().is_empty());
}

#[test]
fn oversized_member_list_fails_before_any_write() {
    let (service, _dir) = setup();
    let alice = service.login("alice").unwrap();

    let mut ids: Vec<UserId> = (1000..3000).map(UserId).collect();
    ids.push(alice.user_id);
    assert_eq!(ids.len(), 2001);

    let err = service.new_chat(&alice.security_key, &ids).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::MemberCount { got: 2001, max: 2000 })
    ));

    let conn = service.database().conn().unwrap();
    assert!(Chats::new(&conn).list_for_user(alice.user_id).unwrap().is_empty());
}

#[test]
fn membership_gate_blocks_every_chat_mutation() {
    let (service, _dir) = setup();
    let t = trio(&service);
    let dave = service.login("dave").unwrap();
    let msg = service
        .send_message(&t.a.security_key, t.chat, &OutgoingMessage::text("hi"))
        .unwrap();
    let before = service.conversation(&t.a.security_key, t.chat).unwrap();

    let key = &dave.security_key;
    let attempts = [
        service.rename_chat(key, t.chat, "mine").unwrap_err(),
        service.add_members(key, t.chat, &[dave.user_id]).unwrap_err(),
        service.remove_member(key, t.chat, t.b.user_id).unwrap_err(),
        service.leave_group(key, t.chat).unwrap_err(),
        service.comment_message(key, msg, "👀").unwrap_err(),
        service.mark_seen(key, msg).unwrap_err(),
        service.delete_message(key, msg).unwrap_err(),
    ];
    for err in attempts {
        assert_eq!(err.kind(), ErrorKind::Forbidden, "{err}");
    }

    let after = service.conversation(&t.a.security_key, t.chat).unwrap();
    assert_eq!(before, after);
}

#[test]
fn mark_seen_twice_is_idempotent() {
    let (service, _dir) = setup();
    let t = trio(&service);
    let msg = service
        .send_message(&t.a.security_key, t.chat, &OutgoingMessage::text("hi"))
        .unwrap();

    service.mark_seen(&t.c.security_key, msg).unwrap();
    service.mark_seen(&t.c.security_key, msg).unwrap();

    let view = service.message(&t.c.security_key, msg).unwrap();
    assert_eq!(view.seen_by, vec![t.c.user_id]);
}

#[test]
fn comment_keeps_only_latest_and_uncomment_clears() {
    let (service, _dir) = setup();
    let t = trio(&service);
    let msg = service
        .send_message(&t.a.security_key, t.chat, &OutgoingMessage::text("hi"))
        .unwrap();

    service.comment_message(&t.b.security_key, msg, "😂").unwrap();
    service.comment_message(&t.b.security_key, msg, "❤️").unwrap();
    let view = service.message(&t.a.security_key, msg).unwrap();
    assert_eq!(view.comments.len(), 1);
    assert_eq!(view.comments[0].text, "❤️");

    service.uncomment_message(&t.b.security_key, msg).unwrap();
    let view = service.message(&t.a.security_key, msg).unwrap();
    assert!(view.comments.is_empty());
    let rows = service.message_statuses(&t.a.security_key, msg).unwrap();
    assert!(rows.iter().all(|r| r.comment.is_empty()));
}

#[test]
fn private_chat_keeps_two_members() {
    let (service, _dir) = setup();
    let alice = service.login("alice").unwrap();
    let bob = service.login("bob").unwrap();
    let carol = service.login("carol").unwrap();
    let chat = service
        .new_chat(&alice.security_key, &[alice.user_id, bob.user_id])
        .unwrap();

    let err = service
        .add_members(&alice.security_key, chat, &[carol.user_id])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAGroup);
    let err = service.leave_group(&bob.security_key, chat).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAGroup);

    let conv = service.conversation(&alice.security_key, chat).unwrap();
    assert!(!conv.chat.is_group);
    assert_eq!(conv.members.len(), 2);
}

#[test]
fn unknown_member_leaves_no_partial_chat() {
    let (service, _dir) = setup();
    let alice = service.login("alice").unwrap();
    let bob = service.login("bob").unwrap();

    let err = service
        .new_chat(
            &alice.security_key,
            &[alice.user_id, bob.user_id, UserId(9_999)],
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::MemberNotFound(UserId(9_999))));

    let conn = service.database().conn().unwrap();
    let chats = Chats::new(&conn);
    assert!(chats.list_for_user(alice.user_id).unwrap().is_empty());
    assert!(chats.list_for_user(bob.user_id).unwrap().is_empty());
}

#[test]
fn history_renders_in_send_order() {
    let (service, _dir) = setup();
    let t = trio(&service);
    for (who, text) in [(&t.a, "one"), (&t.b, "two"), (&t.c, "three"), (&t.a, "four")] {
        service
            .send_message(&who.security_key, t.chat, &OutgoingMessage::text(text))
            .unwrap();
    }

    let conv = service.conversation(&t.b.security_key, t.chat).unwrap();
    let texts: Vec<_> = conv
        .messages
        .iter()
        .map(|m| m.message.text.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(texts, ["one", "two", "three", "four"]);
}
