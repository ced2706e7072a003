//! 变量解析和管理

use super::FunctionState;
use crate::error::ScopeError;

/// 单个函数最多的局部变量数（槽位用 u8 寻址）
pub const MAX_LOCALS: usize = u8::MAX as usize + 1;

/// 局部变量信息
#[derive(Debug, Clone, Copy)]
pub struct Local<'src> {
    pub name: &'src str,
    pub depth: usize,
    pub is_initialized: bool,
}

/// 进入新作用域
pub fn begin_scope(state: &mut FunctionState) {
    state.scope_depth += 1;
}

/// 退出作用域，返回弹出的变量数量
pub fn end_scope(state: &mut FunctionState) -> usize {
    state.scope_depth -= 1;

    let mut popped = 0;
    while let Some(local) = state.locals.last() {
        if local.depth <= state.scope_depth {
            break;
        }
        state.locals.pop();
        popped += 1;
    }
    popped
}

/// 添加局部变量（未初始化），返回其槽位
pub fn add_local<'src>(state: &mut FunctionState<'src>, name: &'src str) -> Result<u8, ScopeError> {
    if state.locals.len() >= MAX_LOCALS {
        return Err(ScopeError::TooManyLocals);
    }

    // 同作用域内不允许重名
    for local in state.locals.iter().rev() {
        if local.depth < state.scope_depth {
            break;
        }
        if local.name == name {
            return Err(ScopeError::AlreadyDeclared);
        }
    }

    state.locals.push(Local {
        name,
        depth: state.scope_depth,
        is_initialized: false,
    });
    Ok((state.locals.len() - 1) as u8)
}

/// 标记最后一个变量为已初始化
pub fn mark_initialized(state: &mut FunctionState) {
    if state.scope_depth == 0 {
        return;
    }
    if let Some(local) = state.locals.last_mut() {
        local.is_initialized = true;
    }
}

/// 从内向外解析局部变量；未找到返回 Ok(None)，交给全局变量处理
pub fn resolve_local(state: &FunctionState, name: &str) -> Result<Option<u8>, ScopeError> {
    for (i, local) in state.locals.iter().enumerate().rev() {
        if local.name == name {
            if !local.is_initialized {
                return Err(ScopeError::ReadInOwnInitializer);
            }
            return Ok(Some(i as u8));
        }
    }
    Ok(None)
}
