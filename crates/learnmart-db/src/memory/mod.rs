//! In-process repositories for tests.
//!
//! [`MemoryStore`] implements every repository trait over one set of tables
//! behind a single mutex, so multi-row operations are atomic the same way a
//! database transaction is.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use learnmart_core::{PaginationParams, RepoError, RepoResult};
use learnmart_models::{
    Bid, Category, CategoryFilterParams, CoinRatio, Course, CourseFilterParams, CourseStatus,
    EnrolledCourse, Enrollment, Gig, GigFilterParams, GigStatus, Lecture, LectureStatus,
    Notification, NotificationFilterParams, PurchaseType, Section, Transaction,
    TransactionFilterParams, User, UserFilterParams,
};

use crate::traits::*;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    courses: HashMap<Uuid, Course>,
    sections: HashMap<Uuid, Section>,
    lectures: HashMap<Uuid, Lecture>,
    enrollments: Vec<Enrollment>,
    gigs: HashMap<Uuid, Gig>,
    bids: Vec<Bid>,
    transactions: Vec<Transaction>,
    coin_ratio: CoinRatio,
    notifications: Vec<Notification>,
}

impl Tables {
    /// Validates every movement against the running balances before
    /// touching anything, then applies them all.
    fn apply_movements(&mut self, movements: &[Transaction]) -> RepoResult<()> {
        let mut balances: HashMap<Uuid, i64> = HashMap::new();
        for movement in movements {
            let current = match balances.get(&movement.user_id) {
                Some(balance) => *balance,
                None => self
                    .users
                    .get(&movement.user_id)
                    .map(|u| u.coins)
                    .ok_or(RepoError::NotFound)?,
            };
            let next = current + movement.signed_coins();
            if next < 0 {
                return Err(RepoError::InsufficientCoins);
            }
            balances.insert(movement.user_id, next);

            if movement.purchase_type == PurchaseType::Coins
                && let Some(reference) = &movement.reference_id
                && self.transactions.iter().any(|t| {
                    t.purchase_type == PurchaseType::Coins
                        && t.reference_id.as_deref() == Some(reference.as_str())
                })
            {
                return Err(RepoError::Conflict(
                    "Payment reference already used".to_string(),
                ));
            }
        }

        let now = Utc::now();
        for (user_id, balance) in balances {
            if let Some(user) = self.users.get_mut(&user_id) {
                user.coins = balance;
                user.updated_at = now;
            }
        }
        self.transactions.extend(movements.iter().cloned());
        Ok(())
    }

    fn sorted_bids(&self, gig_id: Uuid) -> Vec<Bid> {
        let mut bids: Vec<Bid> = self.bids.iter().filter(|b| b.gig_id == gig_id).cloned().collect();
        bids.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.created_at.cmp(&b.created_at)));
        bids
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets a user's balance directly. Tests use this to fund accounts.
    pub fn set_coins(&self, user_id: Uuid, coins: i64) -> RepoResult<()> {
        let mut tables = self.lock();
        let user = tables.users.get_mut(&user_id).ok_or(RepoError::NotFound)?;
        user.coins = coins;
        Ok(())
    }

    /// Moves a gig's window, letting tests open or expire it.
    pub fn set_gig_window(
        &self,
        gig_id: Uuid,
        starts_at: chrono::DateTime<Utc>,
        ends_at: chrono::DateTime<Utc>,
    ) -> RepoResult<()> {
        let mut tables = self.lock();
        let gig = tables.gigs.get_mut(&gig_id).ok_or(RepoError::NotFound)?;
        gig.starts_at = starts_at;
        gig.ends_at = ends_at;
        Ok(())
    }
}

fn paginate<T>(items: Vec<T>, pagination: &PaginationParams) -> Page<T> {
    let total = items.len() as i64;
    let page = items
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.limit() as usize)
        .collect();
    (page, total)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        Ok(self.lock().users.values().any(|u| u.email == email))
    }

    async fn create(&self, user: &User) -> RepoResult<()> {
        let mut tables = self.lock();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict("Email already exists".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        let mut tables = self.lock();
        let stored = tables.users.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        stored.name = user.name.clone();
        stored.bio = user.bio.clone();
        stored.avatar_key = user.avatar_key.clone();
        stored.role = user.role;
        stored.is_blocked = user.is_blocked;
        stored.updated_at = user.updated_at;
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<()> {
        let mut tables = self.lock();
        let stored = tables.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        stored.password_hash = password_hash.to_string();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn list(&self, filters: &UserFilterParams) -> RepoResult<Page<User>> {
        let tables = self.lock();
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| filters.role.is_none_or(|r| u.role == r))
            .filter(|u| {
                filters
                    .search
                    .as_deref()
                    .is_none_or(|s| contains_ci(&u.name, s) || contains_ci(&u.email, s))
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(users, &filters.pagination))
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Category>> {
        Ok(self.lock().categories.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        Ok(self
            .lock()
            .categories
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn create(&self, category: &Category) -> RepoResult<()> {
        let mut tables = self.lock();
        if tables.categories.values().any(|c| c.name.eq_ignore_ascii_case(&category.name)) {
            return Err(RepoError::Conflict(
                "Category with this name already exists".to_string(),
            ));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update(&self, category: &Category) -> RepoResult<()> {
        let mut tables = self.lock();
        if tables
            .categories
            .values()
            .any(|c| c.id != category.id && c.name.eq_ignore_ascii_case(&category.name))
        {
            return Err(RepoError::Conflict(
                "Category with this name already exists".to_string(),
            ));
        }
        let stored = tables.categories.get_mut(&category.id).ok_or(RepoError::NotFound)?;
        *stored = category.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        self.lock()
            .categories
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn is_in_use(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.lock().courses.values().any(|c| c.category_id == id))
    }

    async fn list(&self, filters: &CategoryFilterParams) -> RepoResult<Page<Category>> {
        let tables = self.lock();
        let mut categories: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| filters.search.as_deref().is_none_or(|s| contains_ci(&c.name, s)))
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(paginate(categories, &filters.pagination))
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Course>> {
        Ok(self.lock().courses.get(&id).cloned())
    }

    async fn create(&self, course: &Course) -> RepoResult<()> {
        self.lock().courses.insert(course.id, course.clone());
        Ok(())
    }

    async fn update(&self, course: &Course) -> RepoResult<()> {
        let mut tables = self.lock();
        let stored = tables.courses.get_mut(&course.id).ok_or(RepoError::NotFound)?;
        *stored = course.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let mut tables = self.lock();
        tables.courses.remove(&id).ok_or(RepoError::NotFound)?;
        tables.sections.retain(|_, s| s.course_id != id);
        tables.lectures.retain(|_, l| l.course_id != id);
        tables.enrollments.retain(|e| e.course_id != id);
        Ok(())
    }

    async fn list_published(&self, filters: &CourseFilterParams) -> RepoResult<Page<Course>> {
        let tables = self.lock();
        let mut courses: Vec<Course> = tables
            .courses
            .values()
            .filter(|c| c.status == CourseStatus::Published)
            .filter(|c| filters.category_id.is_none_or(|id| c.category_id == id))
            .filter(|c| filters.level.is_none_or(|l| c.level == l))
            .filter(|c| {
                filters
                    .search
                    .as_deref()
                    .is_none_or(|s| contains_ci(&c.title, s) || contains_ci(&c.description, s))
            })
            .cloned()
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(courses, &filters.pagination))
    }

    async fn list_by_instructor(
        &self,
        instructor_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<Course>> {
        let tables = self.lock();
        let mut courses: Vec<Course> = tables
            .courses
            .values()
            .filter(|c| c.instructor_id == instructor_id)
            .cloned()
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(courses, pagination))
    }
}

#[async_trait]
impl SectionRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Section>> {
        Ok(self.lock().sections.get(&id).cloned())
    }

    async fn list_by_course(&self, course_id: Uuid) -> RepoResult<Vec<Section>> {
        let tables = self.lock();
        let mut sections: Vec<Section> = tables
            .sections
            .values()
            .filter(|s| s.course_id == course_id)
            .cloned()
            .collect();
        sections.sort_by(|a, b| a.position.cmp(&b.position).then(a.created_at.cmp(&b.created_at)));
        Ok(sections)
    }

    async fn create(&self, section: &Section) -> RepoResult<()> {
        self.lock().sections.insert(section.id, section.clone());
        Ok(())
    }

    async fn update(&self, section: &Section) -> RepoResult<()> {
        let mut tables = self.lock();
        let stored = tables.sections.get_mut(&section.id).ok_or(RepoError::NotFound)?;
        *stored = section.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let mut tables = self.lock();
        tables.sections.remove(&id).ok_or(RepoError::NotFound)?;
        tables.lectures.retain(|_, l| l.section_id != id);
        Ok(())
    }
}

#[async_trait]
impl LectureRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Lecture>> {
        Ok(self.lock().lectures.get(&id).cloned())
    }

    async fn find_by_video_key(&self, video_key: &str) -> RepoResult<Option<Lecture>> {
        Ok(self
            .lock()
            .lectures
            .values()
            .find(|l| l.video_key.as_deref() == Some(video_key))
            .cloned())
    }

    async fn list_by_course(&self, course_id: Uuid) -> RepoResult<Vec<Lecture>> {
        let tables = self.lock();
        let mut lectures: Vec<Lecture> = tables
            .lectures
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        lectures.sort_by(|a, b| a.position.cmp(&b.position).then(a.created_at.cmp(&b.created_at)));
        Ok(lectures)
    }

    async fn create(&self, lecture: &Lecture) -> RepoResult<()> {
        self.lock().lectures.insert(lecture.id, lecture.clone());
        Ok(())
    }

    async fn update(&self, lecture: &Lecture) -> RepoResult<()> {
        let mut tables = self.lock();
        let stored = tables.lectures.get_mut(&lecture.id).ok_or(RepoError::NotFound)?;
        *stored = lecture.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        self.lock()
            .lectures
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn count_ready(&self, course_id: Uuid) -> RepoResult<i64> {
        Ok(self
            .lock()
            .lectures
            .values()
            .filter(|l| l.course_id == course_id && l.status == LectureStatus::Ready)
            .count() as i64)
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryStore {
    async fn find(&self, user_id: Uuid, course_id: Uuid) -> RepoResult<Option<Enrollment>> {
        Ok(self
            .lock()
            .enrollments
            .iter()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned())
    }

    async fn enroll(&self, enrollment: &Enrollment, movements: &[Transaction]) -> RepoResult<()> {
        let mut tables = self.lock();
        if tables
            .enrollments
            .iter()
            .any(|e| e.user_id == enrollment.user_id && e.course_id == enrollment.course_id)
        {
            return Err(RepoError::Conflict(
                "Already enrolled in this course".to_string(),
            ));
        }
        tables.apply_movements(movements)?;
        tables.enrollments.push(enrollment.clone());
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<EnrolledCourse>> {
        let tables = self.lock();
        let mut enrolled: Vec<EnrolledCourse> = tables
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| {
                tables.courses.get(&e.course_id).map(|course| EnrolledCourse {
                    enrollment_id: e.id,
                    enrolled_at: e.created_at,
                    course: course.clone(),
                })
            })
            .collect();
        enrolled.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(paginate(enrolled, pagination))
    }

    async fn count_for_course(&self, course_id: Uuid) -> RepoResult<i64> {
        Ok(self
            .lock()
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .count() as i64)
    }
}

#[async_trait]
impl GigRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Gig>> {
        Ok(self.lock().gigs.get(&id).cloned())
    }

    async fn create(&self, gig: &Gig) -> RepoResult<()> {
        self.lock().gigs.insert(gig.id, gig.clone());
        Ok(())
    }

    async fn list(&self, filters: &GigFilterParams) -> RepoResult<Page<Gig>> {
        let tables = self.lock();
        let mut gigs: Vec<Gig> = tables
            .gigs
            .values()
            .filter(|g| filters.status.is_none_or(|s| g.status == s))
            .cloned()
            .collect();
        gigs.sort_by(|a, b| a.ends_at.cmp(&b.ends_at));
        Ok(paginate(gigs, &filters.pagination))
    }

    async fn highest_bid(&self, gig_id: Uuid) -> RepoResult<Option<Bid>> {
        Ok(self.lock().sorted_bids(gig_id).into_iter().next())
    }

    async fn count_bids(&self, gig_id: Uuid) -> RepoResult<i64> {
        Ok(self.lock().bids.iter().filter(|b| b.gig_id == gig_id).count() as i64)
    }

    async fn place_bid(&self, bid: &Bid) -> RepoResult<Option<Bid>> {
        let mut tables = self.lock();
        if !tables.gigs.contains_key(&bid.gig_id) {
            return Err(RepoError::NotFound);
        }
        let previous = tables.sorted_bids(bid.gig_id).into_iter().next();
        if let Some(previous) = &previous
            && bid.amount <= previous.amount
        {
            return Err(RepoError::Conflict(format!(
                "Bid must be higher than the current highest bid of {}",
                previous.amount
            )));
        }
        tables.bids.push(bid.clone());
        Ok(previous)
    }

    async fn list_bids(
        &self,
        gig_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<Bid>> {
        Ok(paginate(self.lock().sorted_bids(gig_id), pagination))
    }

    async fn list_bids_by_instructor(
        &self,
        instructor_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<Bid>> {
        let tables = self.lock();
        let mut bids: Vec<Bid> = tables
            .bids
            .iter()
            .filter(|b| b.instructor_id == instructor_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(bids, pagination))
    }

    async fn bids_by_amount(&self, gig_id: Uuid) -> RepoResult<Vec<Bid>> {
        Ok(self.lock().sorted_bids(gig_id))
    }

    async fn settle(
        &self,
        gig_id: Uuid,
        winning_bid_id: Option<Uuid>,
        movements: &[Transaction],
    ) -> RepoResult<Gig> {
        let mut tables = self.lock();
        let status = tables.gigs.get(&gig_id).ok_or(RepoError::NotFound)?.status;
        if status != GigStatus::Open {
            return Err(RepoError::Conflict("Gig is already closed".to_string()));
        }
        tables.apply_movements(movements)?;

        let gig = tables.gigs.get_mut(&gig_id).ok_or(RepoError::NotFound)?;
        gig.status = GigStatus::Closed;
        gig.winning_bid_id = winning_bid_id;
        Ok(gig.clone())
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn apply(&self, movements: &[Transaction]) -> RepoResult<()> {
        self.lock().apply_movements(movements)
    }

    async fn find_by_reference(
        &self,
        purchase_type: PurchaseType,
        reference_id: &str,
    ) -> RepoResult<Option<Transaction>> {
        Ok(self
            .lock()
            .transactions
            .iter()
            .find(|t| {
                t.purchase_type == purchase_type && t.reference_id.as_deref() == Some(reference_id)
            })
            .cloned())
    }

    async fn list(
        &self,
        user_id: Uuid,
        filters: &TransactionFilterParams,
    ) -> RepoResult<Page<Transaction>> {
        let tables = self.lock();
        let mut transactions: Vec<Transaction> = tables
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter(|t| filters.transaction_type.matches(t.transaction_type))
            .filter(|t| filters.purchase_type.matches(t.purchase_type))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(transactions, &filters.pagination))
    }
}

#[async_trait]
impl CoinRatioRepository for MemoryStore {
    async fn get(&self) -> RepoResult<CoinRatio> {
        Ok(self.lock().coin_ratio.clone())
    }

    async fn set(&self, ratio: &CoinRatio) -> RepoResult<()> {
        self.lock().coin_ratio = ratio.clone();
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn create(&self, notification: &Notification) -> RepoResult<()> {
        self.lock().notifications.push(notification.clone());
        Ok(())
    }

    async fn list(
        &self,
        user_id: Uuid,
        filters: &NotificationFilterParams,
    ) -> RepoResult<Page<Notification>> {
        let unread_only = filters.unread_only == Some(true);
        let tables = self.lock();
        let mut notifications: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(notifications, &filters.pagination))
    }

    async fn unread_count(&self, user_id: Uuid) -> RepoResult<i64> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> RepoResult<Notification> {
        let mut tables = self.lock();
        let notification = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or(RepoError::NotFound)?;
        notification.is_read = true;
        Ok(notification.clone())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> RepoResult<i64> {
        let mut tables = self.lock();
        let mut changed = 0;
        for notification in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            notification.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> RepoResult<()> {
        let mut tables = self.lock();
        let before = tables.notifications.len();
        tables
            .notifications
            .retain(|n| !(n.id == id && n.user_id == user_id));
        if tables.notifications.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
