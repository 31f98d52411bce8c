// ==========================================
// 草稿管理集成测试
// ==========================================
// 目标: 验证 默认草稿播种 / 锁定前缀 / 命名草稿守卫 / 学期增删
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod draft_manager_test {
    use crate::test_helpers::{
        create_test_db, make_course, make_student, make_transcript, open_shared,
    };
    use study_plan_audit::api::{ApiError, CatalogApi, PlanApi};
    use study_plan_audit::domain::types::{Term, TranscriptStatus};

    const STUDENT: &str = "S1";

    fn setup(db_path: &str) -> (CatalogApi, PlanApi) {
        let conn = open_shared(db_path);
        let catalog = CatalogApi::new(conn.clone());
        let plan = PlanApi::new(conn).unwrap();

        catalog.create_course(&make_course("c101", "CS101", 3.0)).unwrap();
        catalog.create_course(&make_course("c102", "CS102", 3.0)).unwrap();
        catalog.register_student(&make_student(STUDENT, 2024)).unwrap();
        catalog.assign_advisor("A1", STUDENT).unwrap();

        (catalog, plan)
    }

    #[test]
    fn test_default_semester_sequence() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);

        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();
        let views = plan.get_semester_views(&draft.draft_id).unwrap();

        // 入学年秋季起 秋/春 交替, 共 8 个学期, 无夏季
        assert_eq!(views.len(), 8);
        let expected = [
            (Term::Fall, 2024),
            (Term::Spring, 2025),
            (Term::Fall, 2025),
            (Term::Spring, 2026),
            (Term::Fall, 2026),
            (Term::Spring, 2027),
            (Term::Fall, 2027),
            (Term::Spring, 2028),
        ];
        for (view, (term, year)) in views.iter().zip(expected) {
            assert_eq!((view.term, view.year), (term, year));
            assert!(!view.is_locked);
        }
    }

    #[test]
    fn test_locked_prefix_matches_transcript_semesters() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (catalog, plan) = setup(&db_path);

        // 草稿创建前已有两个不同学期的成绩: 前两个学期锁定
        catalog.add_transcript_entry(&make_transcript(
            STUDENT, "c101", Term::Fall, 2024, TranscriptStatus::Completed, Some("A"), 3.0,
        )).unwrap();
        catalog.add_transcript_entry(&make_transcript(
            STUDENT, "c102", Term::Spring, 2025, TranscriptStatus::InProgress, None, 3.0,
        )).unwrap();

        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();
        let views = plan.get_semester_views(&draft.draft_id).unwrap();

        assert!(views[0].is_locked);
        assert!(views[1].is_locked);
        assert!(!views[2].is_locked);

        // 锁定学期拒绝编辑
        assert!(matches!(
            plan.add_course(&draft.draft_id, "c102", 1),
            Err(ApiError::ConflictError(_))
        ));
        // 移入锁定学期同样拒绝
        plan.add_course(&draft.draft_id, "c102", 3).unwrap();
        assert!(matches!(
            plan.move_course(&draft.draft_id, "c102", 1),
            Err(ApiError::ConflictError(_))
        ));
    }

    #[test]
    fn test_move_out_of_locked_semester_rejected() {
        use study_plan_audit::domain::plan::PlanEntry;
        use study_plan_audit::repository::PlanEntryRepository;

        let (_tmp, db_path) = create_test_db().unwrap();
        let (catalog, plan) = setup(&db_path);

        catalog.add_transcript_entry(&make_transcript(
            STUDENT, "c101", Term::Fall, 2024, TranscriptStatus::Completed, Some("A"), 3.0,
        )).unwrap();

        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();
        let views = plan.get_semester_views(&draft.draft_id).unwrap();
        assert!(views[0].is_locked);

        // 历史数据可能把条目留在锁定学期; 移出同样被拒绝
        let entry_repo = PlanEntryRepository::new(open_shared(&db_path));
        entry_repo
            .insert(&PlanEntry::new(&draft.draft_id, "c102", 1, 0))
            .unwrap();

        assert!(matches!(
            plan.move_course(&draft.draft_id, "c102", 3),
            Err(ApiError::ConflictError(_))
        ));
    }

    #[test]
    fn test_seeding_failure_leaves_no_draft() {
        use study_plan_audit::domain::plan::{PlanDraft, PlanSemester};
        use study_plan_audit::repository::PlanDraftRepository;

        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, _plan) = setup(&db_path);

        let draft = PlanDraft::new(STUDENT, "备选", false);
        // 重复的 semester_no 使第二条学期插入违反主键约束
        let semesters = vec![
            PlanSemester {
                draft_id: draft.draft_id.clone(),
                semester_no: 1,
                term: Term::Fall,
                year: 2024,
                is_locked: false,
            },
            PlanSemester {
                draft_id: draft.draft_id.clone(),
                semester_no: 1,
                term: Term::Spring,
                year: 2025,
                is_locked: false,
            },
        ];

        let draft_repo = PlanDraftRepository::new(open_shared(&db_path));
        assert!(draft_repo.insert_seeded(&draft, &semesters).is_err());

        // 播种失败时草稿一并回滚, 不产生零学期草稿
        assert!(draft_repo.find_by_id(&draft.draft_id).unwrap().is_none());
    }

    #[test]
    fn test_named_draft_create_and_guards() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);

        let default = plan.get_or_create_default_draft(STUDENT).unwrap();
        let named = plan.create_draft(STUDENT, "交换学期备选").unwrap();
        assert!(!named.is_default);

        // 同名冲突
        assert!(matches!(
            plan.create_draft(STUDENT, "交换学期备选"),
            Err(ApiError::ConflictError(_))
        ));

        // 默认草稿不可改名/删除
        assert!(plan.rename_draft(&default.draft_id, "改名").is_err());
        assert!(plan.delete_draft(&default.draft_id).is_err());

        // 命名草稿正常改名/删除
        plan.rename_draft(&named.draft_id, "延毕预案").unwrap();
        plan.delete_draft(&named.draft_id).unwrap();

        let drafts = plan.list_drafts(STUDENT).unwrap();
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].is_default);
    }

    #[test]
    fn test_draft_name_length_limit() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);

        let too_long: String = std::iter::repeat('备').take(101).collect();
        assert!(matches!(
            plan.create_draft(STUDENT, &too_long),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            plan.create_draft(STUDENT, "   "),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_add_semester_regular_and_summer() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        // 末尾是 Spring 2028: 常规推进 → Fall 2028
        let ninth = plan.add_semester(&draft.draft_id, false).unwrap();
        assert_eq!(ninth.semester_no, 9);
        assert_eq!((ninth.term, ninth.year), (Term::Fall, 2028));

        // Fall 2028 之后的夏季 → Summer 2029
        let tenth = plan.add_semester(&draft.draft_id, true).unwrap();
        assert_eq!(tenth.semester_no, 10);
        assert_eq!((tenth.term, tenth.year), (Term::Summer, 2029));

        // 夏季之后常规推进 → Fall 2029
        let eleventh = plan.add_semester(&draft.draft_id, false).unwrap();
        assert_eq!((eleventh.term, eleventh.year), (Term::Fall, 2029));
    }

    #[test]
    fn test_remove_semester_guards() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (_catalog, plan) = setup(&db_path);
        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();

        // 非末尾学期不可删
        assert!(matches!(
            plan.remove_semester(&draft.draft_id, 3),
            Err(ApiError::ValidationError(_))
        ));

        // 末尾学期有已提交条目时不可删
        plan.add_course(&draft.draft_id, "c101", 8).unwrap();
        plan.submit_semester(&draft.draft_id, 8).unwrap();
        assert!(matches!(
            plan.remove_semester(&draft.draft_id, 8),
            Err(ApiError::ConflictError(_))
        ));

        // 追加的学期可以删
        plan.add_semester(&draft.draft_id, false).unwrap();
        plan.remove_semester(&draft.draft_id, 9).unwrap();
        assert_eq!(plan.get_semester_views(&draft.draft_id).unwrap().len(), 8);
    }

    #[test]
    fn test_remove_locked_semester_rejected() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let (catalog, plan) = setup(&db_path);

        // 成绩单覆盖全部 8 个模板学期: 末尾学期也被锁定
        let mut term = Term::Fall;
        let mut year = 2024;
        for i in 0..8 {
            let course_id = if i % 2 == 0 { "c101" } else { "c102" };
            // 同课程多学期出现在成绩单中是允许的 (重修)
            catalog.add_transcript_entry(&make_transcript(
                STUDENT, course_id, term, year, TranscriptStatus::Completed, Some("B"), 3.0,
            )).unwrap();
            let next = term.next_regular(year);
            term = next.0;
            year = next.1;
        }

        let draft = plan.get_or_create_default_draft(STUDENT).unwrap();
        assert!(matches!(
            plan.remove_semester(&draft.draft_id, 8),
            Err(ApiError::ConflictError(_))
        ));
    }
}
