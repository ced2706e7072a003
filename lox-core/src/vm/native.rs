//! 内置原生函数

use std::time::{SystemTime, UNIX_EPOCH};

use super::VM;
use crate::value::Value;

/// 注册默认原生函数
pub(super) fn register_defaults(vm: &mut VM) {
    vm.define_native("clock", 0, clock);
}

/// clock()：自 Unix 纪元以来的秒数
fn clock(_args: &[Value]) -> Value {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0);
    Value::Number(seconds)
}
