#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use manuscript_api::models::{
        ChangeStatus, Collaborator, CollaboratorRole, Invitation, InvitationStatus, Manuscript,
        ManuscriptStatus, ManuscriptVersion, Permission, TrackedChange, TrackedChangeDetail, User,
        UserSummary, VersionSummary, VersionType, backup_description,
    };
    use manuscript_api::text::count_words;
    use serde_json::json;
    use uuid::Uuid;

    fn invitation(email: Option<&str>, orcid: Option<&str>) -> Invitation {
        let now = Utc::now();
        Invitation {
            id: Uuid::new_v4(),
            manuscript_id: Uuid::new_v4(),
            inviter_id: Uuid::new_v4(),
            invitee_email: email.map(str::to_string),
            invitee_orcid: orcid.map(str::to_string),
            invitee_name: None,
            role: CollaboratorRole::Reviewer,
            can_edit: false,
            can_invite: false,
            can_delete: false,
            message: Some("Please review".to_string()),
            status: InvitationStatus::Pending,
            token: "secret-token".to_string(),
            expires_at: Invitation::expiry_from(now),
            created_at: now,
            responded_at: None,
        }
    }

    #[test]
    fn test_manuscript_tracks_word_count() {
        let mut manuscript = Manuscript::new(
            "Draft A".to_string(),
            "<p>Hello</p>".to_string(),
            ManuscriptStatus::default(),
            Uuid::new_v4(),
        );
        assert_eq!(manuscript.status, ManuscriptStatus::Draft);
        assert_eq!(manuscript.word_count, 1);

        manuscript.set_content("<h1>Title</h1><p>Hello world</p>".to_string());
        assert_eq!(manuscript.word_count, 3);
        assert!(manuscript.is_creator(manuscript.created_by));
        assert!(!manuscript.is_creator(Uuid::new_v4()));
    }

    #[test]
    fn test_word_count_treats_tags_as_separators() {
        assert_eq!(count_words("<p>a b c</p>"), 3);
        assert_eq!(count_words("<p>one</p><p>two</p>"), 2);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_manuscript_serializes_camel_case() {
        let manuscript = Manuscript::new(
            "Draft".to_string(),
            String::new(),
            ManuscriptStatus::InReview,
            Uuid::new_v4(),
        );
        let value = serde_json::to_value(&manuscript).unwrap();
        assert_eq!(value["status"], "IN_REVIEW");
        assert_eq!(value["wordCount"], 0);
        assert!(value.get("createdBy").is_some());
        assert!(value.get("created_by").is_none());
    }

    #[test]
    fn test_invitation_expiry_boundary() {
        let invitation = invitation(Some("grace@example.org"), None);
        assert_eq!(invitation.expires_at - invitation.created_at, Duration::days(7));
        assert!(!invitation.is_expired(invitation.created_at));
        assert!(invitation.is_expired(invitation.expires_at));
        assert!(invitation.is_expired(invitation.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_invitation_addressing() {
        let by_email = invitation(Some("grace@example.org"), None);
        assert!(by_email.is_addressed_to(&User::new("Grace", "Grace@Example.org")));
        assert!(!by_email.is_addressed_to(&User::new("Eve", "eve@example.org")));

        let by_orcid = invitation(None, Some("0000-0002-1825-0097"));
        let with_orcid = User::new("Josiah", "josiah@example.org").with_orcid("0000-0002-1825-0097");
        assert!(by_orcid.is_addressed_to(&with_orcid));
        assert!(!by_orcid.is_addressed_to(&User::new("Josiah", "josiah@example.org")));
    }

    #[test]
    fn test_invitation_token_is_never_serialized() {
        let value = serde_json::to_value(invitation(Some("a@example.org"), None)).unwrap();
        assert!(value.get("token").is_none());
        assert_eq!(value["role"], "REVIEWER");
        assert_eq!(value["inviteeEmail"], "a@example.org");
    }

    #[test]
    fn test_accepted_invitation_carries_grants() {
        let mut invite = invitation(Some("a@example.org"), None);
        invite.can_edit = true;
        let user_id = Uuid::new_v4();
        let collaborator = invite.to_collaborator(user_id, Utc::now());
        assert_eq!(collaborator.user_id, user_id);
        assert_eq!(collaborator.manuscript_id, invite.manuscript_id);
        assert_eq!(collaborator.added_by, Some(invite.inviter_id));
        assert!(collaborator.grants(Permission::View));
        assert!(collaborator.grants(Permission::Edit));
        assert!(!collaborator.grants(Permission::Delete));
        assert!(!collaborator.grants(Permission::Invite));
    }

    #[test]
    fn test_any_collaborator_may_view() {
        let now = Utc::now();
        let collaborator = Collaborator {
            id: Uuid::new_v4(),
            manuscript_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: CollaboratorRole::Viewer,
            can_edit: false,
            can_invite: false,
            can_delete: false,
            added_by: None,
            created_at: now,
            updated_at: now,
        };
        assert!(collaborator.grants(Permission::View));
        assert!(!collaborator.grants(Permission::Edit));
    }

    #[test]
    fn test_change_resolution_sets_one_timestamp() {
        let resolver = Uuid::new_v4();
        let mut change = TrackedChange {
            id: Uuid::new_v4(),
            manuscript_id: Uuid::new_v4(),
            change_id: "c-1".to_string(),
            change_type: "deletion".to_string(),
            operation: "delete".to_string(),
            content: None,
            old_content: Some("gone".to_string()),
            start_offset: 4,
            end_offset: 8,
            node_type: Some("paragraph".to_string()),
            author_id: Uuid::new_v4(),
            status: ChangeStatus::Pending,
            accepted_by: None,
            created_at: Utc::now(),
            accepted_at: None,
            rejected_at: None,
        };
        assert!(change.is_pending());

        change.resolve(ChangeStatus::Rejected, resolver, Utc::now());
        assert!(!change.is_pending());
        assert_eq!(change.accepted_by, Some(resolver));
        assert!(change.accepted_at.is_none());
        assert!(change.rejected_at.is_some());

        let detail = TrackedChangeDetail {
            author: None,
            resolver: Some(UserSummary::from(&User::new("Ada", "ada@example.org"))),
            change,
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["type"], "deletion");
        assert_eq!(value["status"], "REJECTED");
        assert_eq!(value["oldContent"], "gone");
        assert_eq!(value["resolver"]["name"], "Ada");
    }

    #[test]
    fn test_version_summary_drops_body() {
        let version = ManuscriptVersion {
            id: Uuid::new_v4(),
            manuscript_id: Uuid::new_v4(),
            version_number: 3,
            title: "Draft A".to_string(),
            content: "<p>Hello world</p>".to_string(),
            changes: Some(json!([{ "changeId": "c-1" }])),
            created_by: Uuid::new_v4(),
            version_type: VersionType::Auto,
            description: Some(backup_description(1)),
            word_count: 2,
            created_at: Utc::now(),
        };
        let summary = serde_json::to_value(VersionSummary::from(&version)).unwrap();
        assert_eq!(summary["versionNumber"], 3);
        assert_eq!(summary["versionType"], "AUTO");
        assert_eq!(summary["description"], "Backup before restoring to version 1");
        assert!(summary.get("content").is_none());
        assert!(summary.get("changes").is_none());
    }
}
