//! In-process store backing both account and card contracts.
//!
//! Used when no database is configured and in tests. Each mutation happens
//! under a single write lock, which gives the same per-document atomicity the
//! Postgres store gets from single-statement updates.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::auth::{
    repo::UserStore,
    repo_types::{NewUser, User, UserChanges},
};
use crate::cards::{
    repo::CardStore,
    repo_types::{Card, LikeOp, NewCard},
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    cards: RwLock<CardTable>,
}

#[derive(Default)]
struct CardTable {
    next_seq: u64,
    // (insertion sequence, card); the sequence breaks created_at ties
    rows: HashMap<Uuid, (u64, Card)>,
}

#[cfg(test)]
impl MemoryStore {
    pub async fn card_count(&self) -> usize {
        self.cards.read().await.rows.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Duplicate("users_email_key".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            about: new.about,
            avatar: new.avatar,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        match changes {
            UserChanges::Profile { name, about } => {
                user.name = name;
                user.about = about;
            }
            UserChanges::Avatar(avatar) => user.avatar = avatar,
        }
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn create(&self, new: NewCard) -> StoreResult<Card> {
        let card = Card {
            id: Uuid::new_v4(),
            name: new.name,
            link: new.link,
            owner: new.owner,
            likes: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        let mut table = self.cards.write().await;
        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(card.id, (seq, card.clone()));
        Ok(card)
    }

    async fn find_all(&self) -> StoreResult<Vec<Card>> {
        let table = self.cards.read().await;
        let mut rows: Vec<&(u64, Card)> = table.rows.values().collect();
        rows.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));
        Ok(rows.into_iter().map(|(_, c)| c.clone()).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Card>> {
        let table = self.cards.read().await;
        Ok(table.rows.get(&id).map(|(_, c)| c.clone()))
    }

    async fn update_likes(&self, id: Uuid, op: LikeOp) -> StoreResult<Option<Card>> {
        let mut table = self.cards.write().await;
        let Some((_, card)) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        match op {
            LikeOp::Add(user_id) => {
                if !card.likes.contains(&user_id) {
                    card.likes.push(user_id);
                }
            }
            LikeOp::Remove(user_id) => card.likes.retain(|l| *l != user_id),
        }
        Ok(Some(card.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.cards.write().await.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            name: "Jacques Cousteau".into(),
            about: "Explorer".into(),
            avatar: "https://example.com/a.jpg".into(),
        }
    }

    fn new_card(owner: Uuid, name: &str) -> NewCard {
        NewCard {
            name: name.into(),
            link: "https://example.com/a.jpg".into(),
            owner,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::default();
        let first = UserStore::create(&store, new_user("a@x.com")).await.unwrap();
        let err = UserStore::create(&store, new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn update_missing_user_is_none() {
        let store = MemoryStore::default();
        let res = store
            .update(Uuid::new_v4(), UserChanges::Avatar("https://x.com/a.png".into()))
            .await
            .unwrap();
        assert!(res.is_none());
    }

    #[tokio::test]
    async fn profile_update_changes_only_profile_fields() {
        let store = MemoryStore::default();
        let user = UserStore::create(&store, new_user("a@x.com")).await.unwrap();
        let updated = store
            .update(
                user.id,
                UserChanges::Profile {
                    name: "Sylvia Earle".into(),
                    about: "Oceanographer".into(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Sylvia Earle");
        assert_eq!(updated.avatar, user.avatar);
        assert_eq!(updated.email, user.email);
    }

    #[tokio::test]
    async fn likes_behave_as_a_set() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        let fan = Uuid::new_v4();
        let card = CardStore::create(&store, new_card(owner, "Golden Gate")).await.unwrap();

        store.update_likes(card.id, LikeOp::Add(fan)).await.unwrap();
        let twice = store.update_likes(card.id, LikeOp::Add(fan)).await.unwrap().unwrap();
        assert_eq!(twice.likes, vec![fan]);

        let removed = store.update_likes(card.id, LikeOp::Remove(fan)).await.unwrap().unwrap();
        assert!(removed.likes.is_empty());
        let again = store.update_likes(card.id, LikeOp::Remove(fan)).await.unwrap().unwrap();
        assert!(again.likes.is_empty());
    }

    #[tokio::test]
    async fn find_all_is_newest_first() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        for name in ["first", "second", "third"] {
            CardStore::create(&store, new_card(owner, name)).await.unwrap();
        }
        let names: Vec<String> = store.find_all().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn delete_then_everything_misses() {
        let store = MemoryStore::default();
        let card = CardStore::create(&store, new_card(Uuid::new_v4(), "Golden Gate")).await.unwrap();
        assert!(store.delete(card.id).await.unwrap());
        assert!(!store.delete(card.id).await.unwrap());
        assert!(CardStore::find_by_id(&store, card.id).await.unwrap().is_none());
        assert!(store.update_likes(card.id, LikeOp::Add(Uuid::new_v4())).await.unwrap().is_none());
        assert_eq!(store.card_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_likes_are_not_lost() {
        let store = Arc::new(MemoryStore::default());
        let card = CardStore::create(store.as_ref(), new_card(Uuid::new_v4(), "Golden Gate"))
            .await
            .unwrap();
        let card_id = card.id;

        let likers: Vec<Uuid> = (0..64).map(|_| Uuid::new_v4()).collect();
        let handles: Vec<_> = likers
            .iter()
            .map(|&user| {
                let store = store.clone();
                tokio::spawn(async move { store.update_likes(card_id, LikeOp::Add(user)).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let card = CardStore::find_by_id(store.as_ref(), card_id).await.unwrap().unwrap();
        assert_eq!(card.likes.len(), likers.len());
        assert!(likers.iter().all(|u| card.is_liked_by(*u)));
    }
}
