//! In-memory Jira used by the reconciler tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use jira_reconcile::clients::{
    GatewayError, GatewayResult, GroupGateway, GroupList, GroupRecord, MembershipGateway, Removal,
    UserGateway, UserRecord,
};
use jira_reconcile::CallContext;

#[derive(Default)]
struct State {
    users: BTreeMap<String, UserRecord>,
    groups: BTreeMap<String, GroupRecord>,
    members: BTreeSet<(String, String)>,
    next_id: u32,
    calls: Vec<&'static str>,
    /// Created resources are not visible to reads.
    hide_created: bool,
    /// Next fetch fails with this status.
    fail_fetch: Option<u16>,
    /// Next fetch cancels the call.
    cancel_fetch: bool,
}

/// Fake Jira site implementing every gateway.
#[derive(Clone, Default)]
pub struct FakeJira {
    state: Arc<Mutex<State>>,
}

impl FakeJira {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, account_id: &str, email: &str) {
        let mut s = self.state.lock().unwrap();
        s.users.insert(account_id.to_string(), user(account_id, Some(email)));
    }

    pub fn add_user_without_email(&self, account_id: &str) {
        let mut s = self.state.lock().unwrap();
        s.users.insert(account_id.to_string(), user(account_id, None));
    }

    pub fn add_group(&self, name: &str, group_id: &str) {
        let mut s = self.state.lock().unwrap();
        s.groups.insert(
            name.to_string(),
            GroupRecord {
                name: name.to_string(),
                group_id: Some(group_id.to_string()),
            },
        );
    }

    pub fn add_member(&self, group: &str, account_id: &str) {
        let mut s = self.state.lock().unwrap();
        s.members.insert((group.to_string(), account_id.to_string()));
    }

    /// Remove a resource behind the reconciler's back.
    pub fn drop_group(&self, name: &str) {
        self.state.lock().unwrap().groups.remove(name);
    }

    pub fn drop_member(&self, group: &str, account_id: &str) {
        let mut s = self.state.lock().unwrap();
        s.members.remove(&(group.to_string(), account_id.to_string()));
    }

    pub fn hide_created(&self) {
        self.state.lock().unwrap().hide_created = true;
    }

    pub fn fail_next_fetch(&self, status: u16) {
        self.state.lock().unwrap().fail_fetch = Some(status);
    }

    pub fn cancel_next_fetch(&self) {
        self.state.lock().unwrap().cancel_fetch = true;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.state.lock().unwrap().groups.contains_key(name)
    }

    pub fn has_member(&self, group: &str, account_id: &str) -> bool {
        let s = self.state.lock().unwrap();
        s.members
            .contains(&(group.to_string(), account_id.to_string()))
    }

    /// Shared prelude of every fetch: record the call, apply injected faults.
    fn begin_fetch(&self, ctx: &CallContext, op: &'static str) -> GatewayResult<()> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(op);
        if std::mem::take(&mut s.cancel_fetch) {
            ctx.token().cancel();
        }
        if ctx.is_cancelled() {
            return Err(GatewayError::Cancelled { operation: op });
        }
        if let Some(status) = s.fail_fetch.take() {
            return Err(GatewayError::Status {
                operation: op,
                status,
                message: "boom".to_string(),
            });
        }
        Ok(())
    }

    fn record(&self, op: &'static str) {
        self.state.lock().unwrap().calls.push(op);
    }
}

fn user(account_id: &str, email: Option<&str>) -> UserRecord {
    UserRecord {
        account_id: account_id.to_string(),
        account_type: Some("atlassian".to_string()),
        email_address: email.map(str::to_string),
        display_name: email.map(|e| e.split('@').next().unwrap_or(e).to_string()),
        active: true,
        groups: GroupList::default(),
    }
}

#[async_trait]
impl UserGateway for FakeJira {
    async fn create_user(&self, _ctx: &CallContext, email: &str) -> GatewayResult<UserRecord> {
        self.record("create_user");
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        let account_id = format!("acct-{}", s.next_id);
        let record = user(&account_id, Some(email));
        if !s.hide_created {
            s.users.insert(account_id, record.clone());
        }
        Ok(record)
    }

    async fn fetch_user(
        &self,
        ctx: &CallContext,
        account_id: &str,
        with_groups: bool,
    ) -> GatewayResult<Option<UserRecord>> {
        self.begin_fetch(ctx, "fetch_user")?;
        let s = self.state.lock().unwrap();
        let Some(mut record) = s.users.get(account_id).cloned() else {
            return Ok(None);
        };
        if with_groups {
            let items: Vec<GroupRecord> = s
                .members
                .iter()
                .filter(|(_, a)| a == account_id)
                .map(|(g, _)| GroupRecord {
                    name: g.clone(),
                    group_id: s.groups.get(g).and_then(|r| r.group_id.clone()),
                })
                .collect();
            record.groups = GroupList {
                size: items.len() as u32,
                items,
            };
        }
        Ok(Some(record))
    }

    async fn delete_user(&self, _ctx: &CallContext, account_id: &str) -> GatewayResult<Removal> {
        self.record("delete_user");
        let mut s = self.state.lock().unwrap();
        Ok(match s.users.remove(account_id) {
            Some(_) => Removal::Removed,
            None => Removal::AlreadyAbsent,
        })
    }
}

#[async_trait]
impl GroupGateway for FakeJira {
    async fn create_group(&self, _ctx: &CallContext, name: &str) -> GatewayResult<GroupRecord> {
        self.record("create_group");
        let mut s = self.state.lock().unwrap();
        let record = GroupRecord {
            name: name.to_string(),
            group_id: Some("abc".to_string()),
        };
        if !s.hide_created {
            s.groups.insert(name.to_string(), record.clone());
        }
        Ok(record)
    }

    async fn fetch_group(
        &self,
        ctx: &CallContext,
        name: &str,
    ) -> GatewayResult<Option<GroupRecord>> {
        self.begin_fetch(ctx, "fetch_group")?;
        Ok(self.state.lock().unwrap().groups.get(name).cloned())
    }

    async fn delete_group(&self, _ctx: &CallContext, name: &str) -> GatewayResult<Removal> {
        self.record("delete_group");
        let mut s = self.state.lock().unwrap();
        Ok(match s.groups.remove(name) {
            Some(_) => Removal::Removed,
            None => Removal::AlreadyAbsent,
        })
    }
}

#[async_trait]
impl MembershipGateway for FakeJira {
    async fn add_member(
        &self,
        _ctx: &CallContext,
        group_name: &str,
        account_id: &str,
    ) -> GatewayResult<GroupRecord> {
        self.record("add_member");
        let mut s = self.state.lock().unwrap();
        let Some(group) = s.groups.get(group_name).cloned() else {
            return Err(GatewayError::Status {
                operation: "add group member",
                status: 404,
                message: format!("group {group_name} does not exist"),
            });
        };
        if !s.hide_created {
            s.members
                .insert((group_name.to_string(), account_id.to_string()));
        }
        Ok(group)
    }

    async fn remove_member(
        &self,
        _ctx: &CallContext,
        group_name: &str,
        account_id: &str,
    ) -> GatewayResult<Removal> {
        self.record("remove_member");
        let mut s = self.state.lock().unwrap();
        let key = (group_name.to_string(), account_id.to_string());
        Ok(if s.members.remove(&key) {
            Removal::Removed
        } else {
            Removal::AlreadyAbsent
        })
    }
}
