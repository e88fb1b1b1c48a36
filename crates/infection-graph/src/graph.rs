use infection_core::{IdAllocator, InfectionError, Result, SiteVersion, UserConfig, UserId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// A user in the coaching graph.
///
/// Edges are stored on both ends: a student lists its coaches and a coach
/// lists its students. Only `UserGraph` mutates them, so the two lists never
/// disagree.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    site_version: SiteVersion,
    students: Vec<UserId>,
    coaches: Vec<UserId>,
}

impl User {
    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn site_version(&self) -> SiteVersion {
        self.site_version
    }

    pub fn students(&self) -> &[UserId] {
        &self.students
    }

    pub fn coaches(&self) -> &[UserId] {
        &self.coaches
    }

    pub fn is_coach(&self) -> bool {
        !self.students.is_empty()
    }
}

/// In-memory arena of users addressed by `UserId`.
#[derive(Debug, Clone, Default)]
pub struct UserGraph {
    ids: IdAllocator,
    users: Vec<User>,
    slots: FxHashMap<UserId, usize>,
}

impl UserGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph that draws ids from `ids` instead of a fresh allocator.
    pub fn with_allocator(ids: IdAllocator) -> Self {
        Self {
            ids,
            users: Vec::new(),
            slots: FxHashMap::default(),
        }
    }

    /// Give the allocator back, e.g. to seed the next graph.
    pub fn into_allocator(self) -> IdAllocator {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.users.iter().map(|u| u.id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    pub fn user(&self, id: UserId) -> Result<&User> {
        self.slot(id).map(|i| &self.users[i])
    }

    /// Insert a user with default settings: untagged, no edges.
    pub fn add_default_user(&mut self) -> UserId {
        let id = self.ids.allocate();
        self.insert(User {
            id,
            site_version: SiteVersion::UNTAGGED,
            students: Vec::new(),
            coaches: Vec::new(),
        });
        id
    }

    /// Insert a user, wiring the reverse side of every pre-populated edge.
    ///
    /// All referenced ids are checked before anything is inserted.
    pub fn add_user(&mut self, config: UserConfig) -> Result<UserId> {
        for other in config.students.iter().chain(config.coaches.iter()) {
            self.slot(*other)?;
        }

        let id = self.add_default_user();
        self.set_site_version(id, config.site_version)?;
        for student in config.students {
            self.add_student(id, student)?;
        }
        for coach in config.coaches {
            self.add_student(coach, id)?;
        }
        Ok(id)
    }

    /// Record that `coach` coaches `student`. Calling this twice for the same
    /// pair records the edge twice.
    pub fn add_student(&mut self, coach: UserId, student: UserId) -> Result<()> {
        let coach_slot = self.slot(coach)?;
        let student_slot = self.slot(student)?;
        self.users[coach_slot].students.push(student);
        self.users[student_slot].coaches.push(coach);
        Ok(())
    }

    pub fn add_students<I>(&mut self, coach: UserId, students: I) -> Result<()>
    where
        I: IntoIterator<Item = UserId>,
    {
        for student in students {
            self.add_student(coach, student)?;
        }
        Ok(())
    }

    pub fn is_coach(&self, id: UserId) -> Result<bool> {
        Ok(self.user(id)?.is_coach())
    }

    pub fn site_version(&self, id: UserId) -> Result<SiteVersion> {
        Ok(self.user(id)?.site_version)
    }

    pub fn set_site_version(&mut self, id: UserId, site_version: SiteVersion) -> Result<()> {
        let slot = self.slot(id)?;
        self.users[slot].site_version = site_version;
        Ok(())
    }

    pub fn students(&self, id: UserId) -> Result<&[UserId]> {
        Ok(self.user(id)?.students())
    }

    pub fn coaches(&self, id: UserId) -> Result<&[UserId]> {
        Ok(self.user(id)?.coaches())
    }

    /// Coaches worth visiting after `id`, in traversal order:
    /// the user's own coaches, then its students that coach others, then the
    /// coaches of each of its students. Duplicates are kept; callers dedupe.
    pub fn connected_coaches(&self, id: UserId) -> Result<Vec<UserId>> {
        let user = self.user(id)?;
        let mut out = Vec::with_capacity(user.coaches.len() + user.students.len());

        out.extend_from_slice(&user.coaches);
        for &student in &user.students {
            if self.user(student)?.is_coach() {
                out.push(student);
            }
        }
        for &student in &user.students {
            out.extend_from_slice(&self.user(student)?.coaches);
        }
        Ok(out)
    }

    /// Every user reachable from `start` over coach or student edges,
    /// `start` included, in breadth-first order.
    pub fn component(&self, start: UserId) -> Result<Vec<UserId>> {
        self.slot(start)?;
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([start]);
        let mut order = Vec::new();
        seen.insert(start);

        while let Some(current) = queue.pop_front() {
            order.push(current);
            let user = self.user(current)?;
            for &next in user.coaches.iter().chain(user.students.iter()) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        Ok(order)
    }

    /// Users currently carrying `site_version`, in creation order.
    pub fn tagged_with(&self, site_version: SiteVersion) -> Vec<UserId> {
        self.users
            .iter()
            .filter(|u| u.site_version == site_version)
            .map(|u| u.id)
            .collect()
    }

    fn insert(&mut self, user: User) {
        self.slots.insert(user.id, self.users.len());
        self.users.push(user);
    }

    fn slot(&self, id: UserId) -> Result<usize> {
        self.slots
            .get(&id)
            .copied()
            .ok_or(InfectionError::UserNotFound(id))
    }
}
