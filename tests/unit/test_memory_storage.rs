#[cfg(test)]
mod tests {
    use chrono::Utc;
    use manuscript_api::models::{
        ChangeStatus, Collaborator, CollaboratorRole, Invitation, InvitationStatus, Manuscript,
        ManuscriptStatus, NewVersion, Notification, NotificationType, TrackedChange, User,
        VersionType,
    };
    use manuscript_api::storage::{MemoryStorageBackend, StorageBackend, StorageError};
    use uuid::Uuid;

    async fn seeded() -> (MemoryStorageBackend, User, Manuscript) {
        let storage = MemoryStorageBackend::new();
        let owner = storage
            .create_user(User::new("Ada", "ada@example.org"))
            .await
            .unwrap();
        let manuscript = storage
            .create_manuscript(Manuscript::new(
                "Draft A".to_string(),
                "<p>Hello</p>".to_string(),
                ManuscriptStatus::Draft,
                owner.id,
            ))
            .await
            .unwrap();
        (storage, owner, manuscript)
    }

    fn new_version(manuscript: &Manuscript, author: Uuid) -> NewVersion {
        NewVersion {
            manuscript_id: manuscript.id,
            title: manuscript.title.clone(),
            content: manuscript.content.clone(),
            changes: None,
            created_by: author,
            version_type: VersionType::Manual,
            description: None,
            word_count: manuscript.word_count,
        }
    }

    fn pending_change(manuscript_id: Uuid, author_id: Uuid, change_id: &str) -> TrackedChange {
        TrackedChange {
            id: Uuid::new_v4(),
            manuscript_id,
            change_id: change_id.to_string(),
            change_type: "insertion".to_string(),
            operation: "insert".to_string(),
            content: Some("text".to_string()),
            old_content: None,
            start_offset: 0,
            end_offset: 0,
            node_type: None,
            author_id,
            status: ChangeStatus::Pending,
            accepted_by: None,
            created_at: Utc::now(),
            accepted_at: None,
            rejected_at: None,
        }
    }

    fn collaborator(manuscript_id: Uuid, user_id: Uuid) -> Collaborator {
        let now = Utc::now();
        Collaborator {
            id: Uuid::new_v4(),
            manuscript_id,
            user_id,
            role: CollaboratorRole::Editor,
            can_edit: true,
            can_invite: false,
            can_delete: false,
            added_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let (storage, _, _) = seeded().await;
        let result = storage
            .create_user(User::new("Someone", "ADA@example.org"))
            .await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        assert!(
            storage
                .find_user_by_email("Ada@Example.org")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_version_numbers_are_per_manuscript() {
        let (storage, owner, manuscript) = seeded().await;
        let other = storage
            .create_manuscript(Manuscript::new(
                "Other".to_string(),
                String::new(),
                ManuscriptStatus::Draft,
                owner.id,
            ))
            .await
            .unwrap();

        let v1 = storage.create_version(new_version(&manuscript, owner.id)).await.unwrap();
        let v2 = storage.create_version(new_version(&manuscript, owner.id)).await.unwrap();
        let o1 = storage.create_version(new_version(&other, owner.id)).await.unwrap();
        assert_eq!((v1.version_number, v2.version_number, o1.version_number), (1, 2, 1));

        let listed = storage.list_versions(manuscript.id).await.unwrap();
        let numbers: Vec<i32> = listed.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![2, 1]);

        // Scoped to the owning manuscript
        assert!(storage.get_version(other.id, v1.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_snapshots_then_overwrites() {
        let (storage, owner, manuscript) = seeded().await;
        let v1 = storage.create_version(new_version(&manuscript, owner.id)).await.unwrap();

        let mut edited = manuscript.clone();
        edited.set_content("<p>Hello world</p>".to_string());
        storage.update_manuscript(edited).await.unwrap();

        let outcome = storage
            .restore_version(&v1, owner.id, "Backup before restoring to version 1".to_string())
            .await
            .unwrap();
        assert_eq!(outcome.backup.version_number, 2);
        assert_eq!(outcome.backup.version_type, VersionType::Auto);
        assert_eq!(outcome.backup.content, "<p>Hello world</p>");
        assert_eq!(outcome.backup.word_count, 2);
        assert_eq!(outcome.manuscript.content, "<p>Hello</p>");
        assert_eq!(outcome.manuscript.word_count, 1);

        let live = storage.get_manuscript(manuscript.id).await.unwrap().unwrap();
        assert_eq!(live, outcome.manuscript);
    }

    #[tokio::test]
    async fn test_restore_of_missing_manuscript_writes_nothing() {
        let (storage, owner, manuscript) = seeded().await;
        let v1 = storage.create_version(new_version(&manuscript, owner.id)).await.unwrap();
        let mut orphan = v1.clone();
        orphan.manuscript_id = Uuid::new_v4();

        let result = storage.restore_version(&orphan, owner.id, "backup".to_string()).await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
        assert_eq!(storage.list_versions(manuscript.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_only_moves_pending_changes() {
        let (storage, owner, manuscript) = seeded().await;
        let change = storage
            .create_change(pending_change(manuscript.id, owner.id, "c-1"))
            .await
            .unwrap();

        let resolved = storage
            .resolve_change(manuscript.id, change.id, ChangeStatus::Rejected, owner.id, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.status, ChangeStatus::Rejected);
        assert_eq!(resolved.accepted_by, Some(owner.id));
        assert!(resolved.rejected_at.is_some());
        assert!(resolved.accepted_at.is_none());

        let again = storage
            .resolve_change(manuscript.id, change.id, ChangeStatus::Accepted, owner.id, Utc::now())
            .await
            .unwrap();
        assert!(again.is_none());

        let stored = storage
            .find_change_by_client_id(manuscript.id, "c-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ChangeStatus::Rejected);

        let missing = storage
            .resolve_change(manuscript.id, Uuid::new_v4(), ChangeStatus::Accepted, owner.id, Utc::now())
            .await;
        assert!(matches!(missing, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_manuscript_cascades() {
        let (storage, owner, manuscript) = seeded().await;
        let editor = storage
            .create_user(User::new("Charles", "charles@example.org"))
            .await
            .unwrap();
        storage.add_collaborator(collaborator(manuscript.id, editor.id)).await.unwrap();
        storage
            .create_change(pending_change(manuscript.id, owner.id, "c-1"))
            .await
            .unwrap();
        storage.create_version(new_version(&manuscript, owner.id)).await.unwrap();
        let notification = storage
            .create_notification(Notification::new(
                owner.id,
                NotificationType::VersionCreated,
                "Saved",
                "Version saved",
                Some(manuscript.id),
            ))
            .await
            .unwrap();

        storage.delete_manuscript(manuscript.id).await.unwrap();

        assert!(storage.get_manuscript(manuscript.id).await.unwrap().is_none());
        assert!(storage.list_changes(manuscript.id).await.unwrap().is_empty());
        assert!(storage.list_versions(manuscript.id).await.unwrap().is_empty());
        assert!(storage.list_collaborators(manuscript.id).await.unwrap().is_empty());
        assert!(storage.list_manuscripts_for_user(editor.id).await.unwrap().is_empty());

        // Notifications outlive the manuscript but lose the link
        let inbox = storage.list_notifications(owner.id, false, 10).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id, notification.id);
        assert_eq!(inbox[0].manuscript_id, None);

        let again = storage.delete_manuscript(manuscript.id).await;
        assert!(matches!(again, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_accept_invitation_is_single_use() {
        let (storage, owner, manuscript) = seeded().await;
        let invitee = storage
            .create_user(User::new("Grace", "grace@example.org"))
            .await
            .unwrap();
        let now = Utc::now();
        let invitation = storage
            .create_invitation(Invitation {
                id: Uuid::new_v4(),
                manuscript_id: manuscript.id,
                inviter_id: owner.id,
                invitee_email: Some("grace@example.org".to_string()),
                invitee_orcid: None,
                invitee_name: None,
                role: CollaboratorRole::Editor,
                can_edit: true,
                can_invite: false,
                can_delete: false,
                message: None,
                status: InvitationStatus::Pending,
                token: "token".to_string(),
                expires_at: Invitation::expiry_from(now),
                created_at: now,
                responded_at: None,
            })
            .await
            .unwrap();

        let pending = storage
            .list_pending_invitations_for("GRACE@example.org", None)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);

        let added = storage
            .accept_invitation(invitation.id, invitation.to_collaborator(invitee.id, now))
            .await
            .unwrap();
        assert_eq!(added.role, CollaboratorRole::Editor);

        let stored = storage.get_invitation(invitation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Accepted);
        assert!(stored.responded_at.is_some());

        let second = storage
            .accept_invitation(invitation.id, invitation.to_collaborator(invitee.id, now))
            .await;
        assert!(matches!(second, Err(StorageError::Conflict(_))));
        assert_eq!(storage.list_collaborators(manuscript.id).await.unwrap().len(), 1);
        assert!(
            storage
                .list_pending_invitations_for("grace@example.org", None)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_collaborator_pairs_are_unique() {
        let (storage, _, manuscript) = seeded().await;
        let user_id = Uuid::new_v4();
        storage.add_collaborator(collaborator(manuscript.id, user_id)).await.unwrap();
        let duplicate = storage.add_collaborator(collaborator(manuscript.id, user_id)).await;
        assert!(matches!(duplicate, Err(StorageError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_notifications_are_scoped_to_their_owner() {
        let (storage, owner, _) = seeded().await;
        let other = Uuid::new_v4();
        let notification = storage
            .create_notification(Notification::new(
                owner.id,
                NotificationType::Invitation,
                "Invited",
                "You were invited",
                None,
            ))
            .await
            .unwrap();

        assert!(!storage.mark_notification_read(other, notification.id).await.unwrap());
        assert_eq!(storage.count_unread_notifications(owner.id).await.unwrap(), 1);
        assert!(storage.mark_notification_read(owner.id, notification.id).await.unwrap());
        assert_eq!(storage.count_unread_notifications(owner.id).await.unwrap(), 0);
        assert_eq!(storage.mark_all_notifications_read(owner.id).await.unwrap(), 0);
    }
}
