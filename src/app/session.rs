// ==========================================
// 三战同盟助手 - 用户交互会话
// ==========================================
// 职责: 按用户键控的交互状态存储
// 保证: 同一用户同一时刻最多一个在途测算（single-flight），
//       坐标输入连续出错达到上限后整体取消，不留残余状态
// 说明: 显式注入的键控存储，锁只作用在本存储内部，
//       不暴露底层 map
// ==========================================

use crate::config::MAX_COORD_ATTEMPTS;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

// ==========================================
// 交互状态
// ==========================================

/// 单个用户的交互状态
#[derive(Debug, Clone, PartialEq, Eq)]
enum InteractionState {
    /// 已发起找铜，等待用户回复坐标
    AwaitingCoordinate { scenario: String, attempts: u8 },
    /// 测算进行中
    Computing,
}

/// 坐标输入出错后的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// 还可继续重试，附剩余次数
    Retry { remaining: u8 },
    /// 已达上限，交互整体取消
    Cancelled,
}

/// 会话层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("该用户已有测算在进行中")]
    ComputationInFlight,
}

// ==========================================
// InteractionStore - 键控交互存储
// ==========================================
pub struct InteractionStore {
    inner: Mutex<HashMap<String, InteractionState>>,
}

impl InteractionStore {
    /// 创建空的交互存储
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, InteractionState>> {
        // 持锁代码不会 panic，毒化只可能来自调用线程的其他缺陷；
        // 会话状态可安全继续使用
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// 发起找铜：记录等待坐标的交互（覆盖旧的等待状态）
    ///
    /// 测算进行中的用户不能再次发起。
    pub fn begin_prompt(&self, user_id: &str, scenario: &str) -> Result<(), SessionError> {
        let mut map = self.lock();
        if matches!(map.get(user_id), Some(InteractionState::Computing)) {
            return Err(SessionError::ComputationInFlight);
        }
        map.insert(
            user_id.to_string(),
            InteractionState::AwaitingCoordinate {
                scenario: scenario.to_string(),
                attempts: 0,
            },
        );
        Ok(())
    }

    /// 当前等待坐标的赛季（无等待中交互时为 None）
    pub fn pending_scenario(&self, user_id: &str) -> Option<String> {
        let map = self.lock();
        match map.get(user_id) {
            Some(InteractionState::AwaitingCoordinate { scenario, .. }) => Some(scenario.clone()),
            _ => None,
        }
    }

    /// 记录一次无效的坐标输入
    ///
    /// 达到 MAX_COORD_ATTEMPTS 次时取消整个交互（状态清除）。
    /// 没有等待中交互时按一次性输入处理，同样给出剩余次数。
    pub fn note_invalid_input(&self, user_id: &str) -> RetryOutcome {
        let mut map = self.lock();
        let Some(InteractionState::AwaitingCoordinate { attempts, .. }) = map.get_mut(user_id)
        else {
            return RetryOutcome::Retry {
                remaining: MAX_COORD_ATTEMPTS - 1,
            };
        };

        *attempts += 1;
        if *attempts >= MAX_COORD_ATTEMPTS {
            map.remove(user_id);
            RetryOutcome::Cancelled
        } else {
            let remaining = MAX_COORD_ATTEMPTS - *attempts;
            RetryOutcome::Retry { remaining }
        }
    }

    /// 进入测算状态（single-flight 关卡）
    ///
    /// 等待中的坐标提示被最新一次有效提交取代。
    ///
    /// # 返回
    /// - Ok(()): 本次提交获得执行权
    /// - Err(ComputationInFlight): 已有在途测算
    pub fn begin_computation(&self, user_id: &str) -> Result<(), SessionError> {
        let mut map = self.lock();
        if matches!(map.get(user_id), Some(InteractionState::Computing)) {
            return Err(SessionError::ComputationInFlight);
        }
        map.insert(user_id.to_string(), InteractionState::Computing);
        Ok(())
    }

    /// 测算结束（成功或失败都必须调用），清除状态
    pub fn finish_computation(&self, user_id: &str) {
        let mut map = self.lock();
        if matches!(map.get(user_id), Some(InteractionState::Computing)) {
            map.remove(user_id);
        }
    }

    /// 是否有在途测算
    pub fn is_computing(&self, user_id: &str) -> bool {
        let map = self.lock();
        matches!(map.get(user_id), Some(InteractionState::Computing))
    }

    /// 取消用户的等待中交互（测算状态不受影响）
    pub fn cancel_prompt(&self, user_id: &str) {
        let mut map = self.lock();
        if matches!(
            map.get(user_id),
            Some(InteractionState::AwaitingCoordinate { .. })
        ) {
            map.remove(user_id);
        }
    }
}

impl Default for InteractionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight_per_user() {
        let store = InteractionStore::new();

        store.begin_computation("user-1").unwrap();
        assert!(store.is_computing("user-1"));

        // 同一用户第二次进入被拒
        assert_eq!(
            store.begin_computation("user-1"),
            Err(SessionError::ComputationInFlight)
        );
        // 其他用户不受影响
        store.begin_computation("user-2").unwrap();

        store.finish_computation("user-1");
        assert!(!store.is_computing("user-1"));
        store.begin_computation("user-1").unwrap();
    }

    #[test]
    fn test_prompt_superseded_by_computation() {
        let store = InteractionStore::new();

        store.begin_prompt("user-1", "S1").unwrap();
        assert_eq!(store.pending_scenario("user-1").as_deref(), Some("S1"));

        // 有效提交取代等待中的提示
        store.begin_computation("user-1").unwrap();
        assert!(store.pending_scenario("user-1").is_none());

        // 测算中不能再发起新的找铜
        assert_eq!(
            store.begin_prompt("user-1", "S2"),
            Err(SessionError::ComputationInFlight)
        );
    }

    #[test]
    fn test_reprompt_overwrites_scenario_and_resets_attempts() {
        let store = InteractionStore::new();

        store.begin_prompt("user-1", "S1").unwrap();
        assert_eq!(
            store.note_invalid_input("user-1"),
            RetryOutcome::Retry { remaining: 2 }
        );

        // 重新发起后赛季更新、计数清零
        store.begin_prompt("user-1", "S2").unwrap();
        assert_eq!(store.pending_scenario("user-1").as_deref(), Some("S2"));
        assert_eq!(
            store.note_invalid_input("user-1"),
            RetryOutcome::Retry { remaining: 2 }
        );
    }

    #[test]
    fn test_three_invalid_inputs_cancel_interaction() {
        let store = InteractionStore::new();
        store.begin_prompt("user-1", "S1").unwrap();

        assert_eq!(
            store.note_invalid_input("user-1"),
            RetryOutcome::Retry { remaining: 2 }
        );
        assert_eq!(
            store.note_invalid_input("user-1"),
            RetryOutcome::Retry { remaining: 1 }
        );
        assert_eq!(store.note_invalid_input("user-1"), RetryOutcome::Cancelled);

        // 取消后无残余状态
        assert!(store.pending_scenario("user-1").is_none());
        assert!(!store.is_computing("user-1"));
    }

    #[test]
    fn test_cancel_prompt_leaves_computation_alone() {
        let store = InteractionStore::new();

        store.begin_computation("user-1").unwrap();
        store.cancel_prompt("user-1");
        assert!(store.is_computing("user-1"));
    }
}
