// ==========================================
// 三战同盟助手 - 消息通知能力接口
// ==========================================
// 职责: 核心对外发送文本消息的最小能力面
// 约定: 发后即忘，投递结果不回流到核心；
//       任何具体通道（公众号/企业微信/测试桩）实现本 trait 即可替换
// ==========================================

use async_trait::async_trait;

/// 文本消息发送能力
#[async_trait]
pub trait Messenger: Send + Sync {
    /// 向指定用户发送文本消息（发后即忘）
    ///
    /// # 参数
    /// - `user_id`: 聊天平台的用户标识（对核心是不透明的）
    /// - `content`: 文本内容
    async fn send_text(&self, user_id: &str, content: &str);
}

// ==========================================
// NoOpMessenger - 空实现
// ==========================================

/// 不发送任何消息的空实现（供脱离聊天通道的场景使用）
pub struct NoOpMessenger;

#[async_trait]
impl Messenger for NoOpMessenger {
    async fn send_text(&self, _user_id: &str, _content: &str) {}
}
