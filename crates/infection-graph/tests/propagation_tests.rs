use infection_core::{AccountingMode, InfectionError, SiteVersion, UserId};
use infection_graph::{limited_propagate, total_propagate, Propagator, UserGraph};

const V1: SiteVersion = SiteVersion(1);

fn users<const N: usize>(graph: &mut UserGraph) -> [UserId; N] {
    std::array::from_fn(|_| graph.add_default_user())
}

fn tagged(graph: &UserGraph, id: UserId) -> bool {
    graph.site_version(id).unwrap() == V1
}

// ---- total propagation ----------------------------------------------------

#[test]
fn test_total_returns_number_of_infections() {
    let mut g = UserGraph::new();
    let [host, student] = users(&mut g);
    g.add_student(host, student).unwrap();

    assert_eq!(total_propagate(&mut g, host, V1).unwrap(), 2);
    assert!(tagged(&g, host));
    assert!(tagged(&g, student));
}

#[test]
fn test_total_infects_all_students_of_host() {
    let mut g = UserGraph::new();
    let [host, s1, s2] = users(&mut g);
    g.add_students(host, [s1, s2]).unwrap();

    total_propagate(&mut g, host, V1).unwrap();
    assert!([host, s1, s2].iter().all(|&u| tagged(&g, u)));
}

#[test]
fn test_total_infects_coach_of_host() {
    let mut g = UserGraph::new();
    let [host, coach] = users(&mut g);
    g.add_student(coach, host).unwrap();

    total_propagate(&mut g, host, V1).unwrap();
    assert!(tagged(&g, host));
    assert!(tagged(&g, coach));
}

#[test]
fn test_total_infects_classmates() {
    let mut g = UserGraph::new();
    let [host, classmate, coach] = users(&mut g);
    g.add_students(coach, [classmate, host]).unwrap();

    total_propagate(&mut g, host, V1).unwrap();
    assert!([host, classmate, coach].iter().all(|&u| tagged(&g, u)));
}

#[test]
fn test_total_infects_coach_of_classmate() {
    let mut g = UserGraph::new();
    let [host, classmate, coach, other_coach] = users(&mut g);
    g.add_students(coach, [classmate, host]).unwrap();
    g.add_student(other_coach, classmate).unwrap();

    total_propagate(&mut g, host, V1).unwrap();
    assert!(tagged(&g, host));
    assert!(tagged(&g, classmate));
    assert!(tagged(&g, other_coach));
}

#[test]
fn test_total_leaves_other_components_alone() {
    let mut g = UserGraph::new();
    let [host, student, stranger, strangers_student] = users(&mut g);
    g.add_student(host, student).unwrap();
    g.add_student(stranger, strangers_student).unwrap();

    total_propagate(&mut g, student, V1).unwrap();
    assert!(tagged(&g, host));
    assert!(!tagged(&g, stranger));
    assert!(!tagged(&g, strangers_student));
}

// ---- limited propagation --------------------------------------------------

#[test]
fn test_limited_rejects_zero_capacity() {
    let mut g = UserGraph::new();
    let [host] = users(&mut g);
    let err = limited_propagate(&mut g, host, 0, V1).unwrap_err();
    assert!(matches!(err, InfectionError::InvalidArgument(_)));
}

#[test]
fn test_limited_coach_and_classmate_do_not_fit() {
    let mut g = UserGraph::new();
    let [host, coach, classmate] = users(&mut g);
    g.add_students(coach, [host, classmate]).unwrap();

    assert_eq!(limited_propagate(&mut g, host, 2, V1).unwrap(), 0);
    assert!(g.tagged_with(V1).is_empty());
}

#[test]
fn test_limited_coach_and_classmate_fit() {
    let mut g = UserGraph::new();
    let [host, coach, classmate] = users(&mut g);
    g.add_students(coach, [host, classmate]).unwrap();

    assert_eq!(limited_propagate(&mut g, host, 3, V1).unwrap(), 3);
    assert!([host, coach, classmate].iter().all(|&u| tagged(&g, u)));
}

fn shared_student_graph() -> (UserGraph, [UserId; 5]) {
    // host -> [s1, s2]; coach -> [s2, s3]
    let mut g = UserGraph::new();
    let ids @ [host, s1, s2, s3, coach] = users(&mut g);
    g.add_students(host, [s1, s2]).unwrap();
    g.add_students(coach, [s2, s3]).unwrap();
    (g, ids)
}

#[test]
fn test_limited_only_host_class_fits() {
    let (mut g, [host, s1, s2, s3, coach]) = shared_student_graph();

    assert_eq!(limited_propagate(&mut g, host, 3, V1).unwrap(), 3);
    assert!(tagged(&g, host) && tagged(&g, s1) && tagged(&g, s2));
    assert!(!tagged(&g, coach));
    assert!(!tagged(&g, s3));
}

#[test]
fn test_limited_both_classes_fit() {
    let (mut g, ids) = shared_student_graph();

    assert_eq!(limited_propagate(&mut g, ids[0], 5, V1).unwrap(), 5);
    assert!(ids.iter().all(|&u| tagged(&g, u)));
}

fn nested_class_graph() -> (UserGraph, [UserId; 4]) {
    // host -> [s1, s2]; s1 -> [s3]
    let mut g = UserGraph::new();
    let ids @ [host, s1, s2, s3] = users(&mut g);
    g.add_students(host, [s1, s2]).unwrap();
    g.add_student(s1, s3).unwrap();
    (g, ids)
}

#[test]
fn test_limited_host_and_student_classes_fit() {
    let (mut g, ids) = nested_class_graph();
    assert_eq!(limited_propagate(&mut g, ids[0], 4, V1).unwrap(), 4);
    assert!(ids.iter().all(|&u| tagged(&g, u)));
}

#[test]
fn test_limited_only_student_class_fits() {
    let (mut g, [host, s1, s2, s3]) = nested_class_graph();

    assert_eq!(limited_propagate(&mut g, host, 2, V1).unwrap(), 2);
    assert!(tagged(&g, s1) && tagged(&g, s3));
    assert!(!tagged(&g, host));
    assert!(!tagged(&g, s2));
}

fn chain_graph() -> (UserGraph, [UserId; 4]) {
    // host -> s1 -> s2 -> s3
    let mut g = UserGraph::new();
    let ids @ [host, s1, s2, s3] = users(&mut g);
    g.add_student(host, s1).unwrap();
    g.add_student(s1, s2).unwrap();
    g.add_student(s2, s3).unwrap();
    (g, ids)
}

#[test]
fn test_limited_chain_all_fit() {
    let (mut g, ids) = chain_graph();
    assert_eq!(limited_propagate(&mut g, ids[0], 4, V1).unwrap(), 4);
    assert!(ids.iter().all(|&u| tagged(&g, u)));
}

#[test]
fn test_limited_chain_still_infects_excluded_students_coach() {
    let (mut g, [host, s1, s2, s3]) = chain_graph();

    assert_eq!(limited_propagate(&mut g, host, 3, V1).unwrap(), 3);
    assert!(tagged(&g, host) && tagged(&g, s1) && tagged(&g, s2));
    assert!(!tagged(&g, s3));
}

#[test]
fn test_limited_greedily_chooses_first_class_that_fits() {
    // host -> [a, b]; a -> [a1, a2]; b -> [b1, b2, b3]
    let mut g = UserGraph::new();
    let [host, a, b, a1, a2, b1, b2, b3] = users(&mut g);
    g.add_students(host, [a, b]).unwrap();
    g.add_students(a, [a1, a2]).unwrap();
    g.add_students(b, [b1, b2, b3]).unwrap();

    assert_eq!(limited_propagate(&mut g, host, 6, V1).unwrap(), 5);
    assert!([host, a, b, a1, a2].iter().all(|&u| tagged(&g, u)));
    assert!([b1, b2, b3].iter().all(|&u| !tagged(&g, u)));
}

#[test]
fn test_limited_coach_class_fits_when_host_class_does_not() {
    // host -> [s1, s2, s3]; coach -> [host, s4]
    let mut g = UserGraph::new();
    let [host, s1, s2, s3, coach, s4] = users(&mut g);
    g.add_students(host, [s1, s2, s3]).unwrap();
    g.add_students(coach, [host, s4]).unwrap();

    assert_eq!(limited_propagate(&mut g, host, 3, V1).unwrap(), 3);
    assert!(tagged(&g, coach) && tagged(&g, host) && tagged(&g, s4));
    assert!([s1, s2, s3].iter().all(|&u| !tagged(&g, u)));
}

#[test]
fn test_limited_single_student_shared_with_other_coach() {
    let mut g = UserGraph::new();
    let [host, student, coach] = users(&mut g);
    g.add_student(host, student).unwrap();
    g.add_student(coach, student).unwrap();

    assert_eq!(limited_propagate(&mut g, host, 3, V1).unwrap(), 3);
    assert!([host, student, coach].iter().all(|&u| tagged(&g, u)));
}

#[test]
fn test_limited_non_coach_start_reaches_its_coach() {
    let mut g = UserGraph::new();
    let [coach, student] = users(&mut g);
    g.add_student(coach, student).unwrap();

    assert_eq!(limited_propagate(&mut g, student, 2, V1).unwrap(), 2);
}

// ---- host accounting ------------------------------------------------------

#[test]
fn test_footprint_repeat_call_is_idempotent() {
    let (mut g, [host, _, _, s3, coach]) = shared_student_graph();

    assert_eq!(limited_propagate(&mut g, host, 3, V1).unwrap(), 3);
    let first = g.tagged_with(V1);
    assert_eq!(limited_propagate(&mut g, host, 3, V1).unwrap(), 0);
    assert_eq!(g.tagged_with(V1), first);
    assert!(!tagged(&g, coach));
    assert!(!tagged(&g, s3));
}

#[test]
fn test_newly_tagged_repeat_call_admits_more_classes() {
    let (mut g, [host, _, _, s3, coach]) = shared_student_graph();
    let propagator = Propagator::default().with_accounting(AccountingMode::NewlyTagged);

    assert_eq!(propagator.limited(&mut g, host, 3, V1).unwrap().count(), 3);
    // The host class is now free, so the second pass has room for the coach
    // and the one student of that class not yet tagged.
    let second = propagator.limited(&mut g, host, 3, V1).unwrap();
    assert_eq!(second.tagged, vec![s3, coach]);
}

#[test]
fn test_modes_agree_on_untagged_graph() {
    let (mut footprint, ids) = shared_student_graph();
    let mut newly = footprint.clone();

    let a = Propagator::default()
        .limited(&mut footprint, ids[0], 4, V1)
        .unwrap();
    let b = Propagator::default()
        .with_accounting(AccountingMode::NewlyTagged)
        .limited(&mut newly, ids[0], 4, V1)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_other_versions_are_overwritten() {
    let mut g = UserGraph::new();
    let [host, student] = users(&mut g);
    g.add_student(host, student).unwrap();
    g.set_site_version(student, SiteVersion(7)).unwrap();

    assert_eq!(total_propagate(&mut g, host, V1).unwrap(), 2);
    assert!(tagged(&g, student));
}
