//! 事件 trait
//!
//! 定义仿真事件接口：一次延时回调（动画阶段结束、周期 tick、用户输入）就是一个事件。

use super::simulator::Simulator;
use super::world::World;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以支持 move/所有权转移。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
