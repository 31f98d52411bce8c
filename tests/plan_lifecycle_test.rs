// ==========================================
// 计划生命周期端到端测试
// ==========================================
// 目标: 验证 加课 → 提交 → 审批/驳回 → 退回修改 的完整闭环
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod plan_lifecycle_test {
    use crate::test_helpers::{
        create_test_db, make_course, make_prereq, make_student, make_transcript, open_shared,
    };
    use study_plan_audit::api::{ApiError, CatalogApi, PlanApi};
    use study_plan_audit::api::plan_api::{WARN_CREDIT_LOAD, WARN_PREREQ};
    use study_plan_audit::domain::types::{PlanEntryStatus, Term, TranscriptStatus};

    const ADVISOR: &str = "A1";
    const STUDENT: &str = "S1";

    /// 五门 3-5 学分课程 + C201 的先修边, 学生 S1 + 导师 A1
    fn setup(db_path: &str) -> (CatalogApi, PlanApi) {
        let conn = open_shared(db_path);
        let catalog = CatalogApi::new(conn.clone());
        let plan = PlanApi::new(conn).unwrap();

        catalog.create_course(&make_course("c101", "CS101", 3.0)).unwrap();
        catalog.create_course(&make_course("c102", "CS102", 4.0)).unwrap();
        catalog.create_course(&make_course("c103", "CS103", 5.0)).unwrap();
        catalog.create_course(&make_course("c104", "CS104", 5.0)).unwrap();
        catalog.create_course(&make_course("c201", "CS201", 4.0)).unwrap();
        catalog.add_dependency(&make_prereq("c201", "c101")).unwrap();

        catalog.register_student(&make_student(STUDENT, 2024)).unwrap();
        catalog.assign_advisor(ADVISOR, STUDENT).unwrap();

        (catalog, plan)
    }

    #[test]
    fn test_default_draft_created_once() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);

        let first = plan.get_or_create_default_draft(STUDENT).unwrap();
        let second = plan.get_or_create_default_draft(STUDENT).unwrap();
        assert_eq!(first.draft_id, second.draft_id);
        assert!(first.is_default);

        let views = plan.get_semester_views(&first.draft_id).unwrap();
        assert_eq!(views.len(), 8);
        assert_eq!((views[0].term, views[0].year), (Term::Fall, 2024));
        assert_eq!((views[1].term, views[1].year), (Term::Spring, 2025));
    }

    #[test]
    fn test_add_course_without_prereq_warns_but_succeeds() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        // C201 的先修课 C101 不在任何位置: 宽松模式软告警
        let warnings = plan.add_course(&draft.draft_id, "c201", 1).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].warning_type, WARN_PREREQ);

        let views = plan.get_semester_views(&draft.draft_id).unwrap();
        assert_eq!(views[0].entries.len(), 1);
        assert!(!views[0].entries[0].prereqs_met);
    }

    #[test]
    fn test_add_course_with_planned_prereq_is_clean() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        assert!(plan.add_course(&draft.draft_id, "c101", 1).unwrap().is_empty());
        // 先修课计划在更早学期: 无告警
        assert!(plan.add_course(&draft.draft_id, "c201", 2).unwrap().is_empty());
        // 无依赖课程随时可加
        assert!(plan.add_course(&draft.draft_id, "c102", 1).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_course_rejected() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        plan.add_course(&draft.draft_id, "c101", 1).unwrap();
        // 同草稿跨学期唯一
        assert!(matches!(
            plan.add_course(&draft.draft_id, "c101", 2),
            Err(ApiError::ConflictError(_))
        ));
    }

    #[test]
    fn test_completed_course_cannot_be_planned() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        catalog
            .add_transcript_entry(&make_transcript(
                STUDENT, "c101", Term::Fall, 2024,
                TranscriptStatus::Completed, Some("A"), 3.0,
            ))
            .unwrap();

        assert!(matches!(
            plan.add_course(&draft.draft_id, "c101", 2),
            Err(ApiError::ConflictError(_))
        ));
    }

    #[test]
    fn test_submit_blocks_hard_prereq_violation() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        plan.add_course(&draft.draft_id, "c201", 1).unwrap();

        // 严格模式: 先修违规升级为硬阻断
        assert!(matches!(
            plan.submit_semester(&draft.draft_id, 1),
            Err(ApiError::ValidationError(_))
        ));

        // 状态保持 DRAFT, 未落半截
        let views = plan.get_semester_views(&draft.draft_id).unwrap();
        assert_eq!(views[0].entries[0].status, PlanEntryStatus::Draft);
    }

    #[test]
    fn test_submit_approve_flow_with_load_warning() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        plan.add_course(&draft.draft_id, "c101", 1).unwrap();

        // 3 学分低于默认下限 12: 告警但提交成功
        let warnings = plan.submit_semester(&draft.draft_id, 1).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].warning_type, WARN_CREDIT_LOAD);

        let views = plan.get_semester_views(&draft.draft_id).unwrap();
        assert_eq!(views[0].status, PlanEntryStatus::Submitted);

        // 已提交学期不可编辑
        assert!(matches!(
            plan.add_course(&draft.draft_id, "c102", 1),
            Err(ApiError::ConflictError(_))
        ));
        assert!(matches!(
            plan.remove_course(&draft.draft_id, "c101"),
            Err(ApiError::ConflictError(_))
        ));

        plan.approve_semester(&draft.draft_id, 1, ADVISOR, "通过").unwrap();
        let views = plan.get_semester_views(&draft.draft_id).unwrap();
        assert_eq!(views[0].status, PlanEntryStatus::Approved);

        let history = plan.list_approvals(&draft.draft_id, 1).unwrap();
        assert_eq!(history.len(), 1);

        // 重复批准: 事务内前置复查拒绝, 不产生第二条记录
        assert!(matches!(
            plan.approve_semester(&draft.draft_id, 1, ADVISOR, "再次"),
            Err(ApiError::ConflictError(_))
        ));
        assert_eq!(plan.list_approvals(&draft.draft_id, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_approval_append_rolls_back_status() {
        use study_plan_audit::domain::plan::ApprovalRecord;
        use study_plan_audit::domain::types::ApprovalDecision;
        use study_plan_audit::repository::{PlanEntryRepository, RepositoryError};

        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        plan.add_course(&draft.draft_id, "c101", 1).unwrap();
        plan.add_course(&draft.draft_id, "c102", 2).unwrap();
        plan.submit_semester(&draft.draft_id, 1).unwrap();
        plan.submit_semester(&draft.draft_id, 2).unwrap();
        plan.approve_semester(&draft.draft_id, 1, ADVISOR, "通过").unwrap();
        let existing = plan.list_approvals(&draft.draft_id, 1).unwrap();

        // 复用既有 approval_id 使记录写入违反主键约束
        let mut record =
            ApprovalRecord::new(&draft.draft_id, 2, ADVISOR, ApprovalDecision::Approved, "通过");
        record.approval_id = existing[0].approval_id.clone();

        let entry_repo = PlanEntryRepository::new(open_shared(&db_path));
        let result = entry_repo.transition_with_approval(
            &draft.draft_id,
            2,
            PlanEntryStatus::Submitted,
            PlanEntryStatus::Approved,
            &record,
        );
        assert!(matches!(
            result,
            Err(RepositoryError::UniqueConstraintViolation(_))
        ));

        // 记录写入失败时状态转换一并回滚
        let views = plan.get_semester_views(&draft.draft_id).unwrap();
        assert_eq!(views[1].status, PlanEntryStatus::Submitted);
        assert!(plan.list_approvals(&draft.draft_id, 2).unwrap().is_empty());
    }

    #[test]
    fn test_submit_refreshes_stale_snapshot() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        // 先加 c201 产生过期的先修快照, 再补上前置课程
        let warnings = plan.add_course(&draft.draft_id, "c201", 2).unwrap();
        assert!(!warnings.is_empty());
        plan.add_course(&draft.draft_id, "c101", 1).unwrap();

        plan.submit_semester(&draft.draft_id, 2).unwrap();

        let views = plan.get_semester_views(&draft.draft_id).unwrap();
        let entry = &views[1].entries[0];
        assert_eq!(entry.status, PlanEntryStatus::Submitted);
        assert!(entry.prereqs_met);
    }

    #[test]
    fn test_reject_revise_resubmit_keeps_full_history() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        plan.add_course(&draft.draft_id, "c103", 1).unwrap();
        plan.submit_semester(&draft.draft_id, 1).unwrap();
        plan.reject_semester(&draft.draft_id, 1, ADVISOR, "学分安排不合理").unwrap();

        let views = plan.get_semester_views(&draft.draft_id).unwrap();
        assert_eq!(views[0].status, PlanEntryStatus::Rejected);

        // 驳回后退回草稿重新编辑
        plan.revise_semester(&draft.draft_id, 1).unwrap();
        plan.add_course(&draft.draft_id, "c104", 1).unwrap();

        plan.submit_semester(&draft.draft_id, 1).unwrap();
        plan.approve_semester(&draft.draft_id, 1, ADVISOR, "通过").unwrap();

        // 审批记录只追加: 驳回 + 批准两条, 时间升序
        let history = plan.list_approvals(&draft.draft_id, 1).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].decision.to_db_str(), "REJECTED");
        assert_eq!(history[1].decision.to_db_str(), "APPROVED");
    }

    #[test]
    fn test_unassigned_advisor_cannot_decide() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        plan.add_course(&draft.draft_id, "c101", 1).unwrap();
        plan.submit_semester(&draft.draft_id, 1).unwrap();

        assert!(matches!(
            plan.approve_semester(&draft.draft_id, 1, "STRANGER", ""),
            Err(ApiError::AuthorizationError(_))
        ));
    }

    #[test]
    fn test_reject_requires_comments() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        plan.add_course(&draft.draft_id, "c101", 1).unwrap();
        plan.submit_semester(&draft.draft_id, 1).unwrap();

        assert!(matches!(
            plan.reject_semester(&draft.draft_id, 1, ADVISOR, "  "),
            Err(ApiError::ValidationError(_))
        ));
        // 状态未变, 仍可正常驳回
        plan.reject_semester(&draft.draft_id, 1, ADVISOR, "课程安排过轻").unwrap();
    }

    #[test]
    fn test_revise_requires_rejected_state() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        plan.add_course(&draft.draft_id, "c101", 1).unwrap();

        // DRAFT 状态不能 revise
        assert!(matches!(
            plan.revise_semester(&draft.draft_id, 1),
            Err(ApiError::ConflictError(_))
        ));
    }

    #[test]
    fn test_move_course_refreshes_snapshot() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        plan.add_course(&draft.draft_id, "c101", 2).unwrap();
        let warnings = plan.add_course(&draft.draft_id, "c201", 1).unwrap();
        assert_eq!(warnings.len(), 1); // 先修课在更晚学期

        // 把 C201 移到先修课之后: 告警消失, 快照刷新
        let warnings = plan.move_course(&draft.draft_id, "c201", 3).unwrap();
        assert!(warnings.is_empty());

        let views = plan.get_semester_views(&draft.draft_id).unwrap();
        let entry = &views[2].entries[0];
        assert_eq!(entry.course_id, "c201");
        assert!(entry.prereqs_met);
    }
}
