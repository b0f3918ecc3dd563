//! Statement checking and the inline Resource Tracker (§4.6/§4.7): walks a
//! bound function body once, threading type inference and the per-location
//! resource-state map together so a move's legality and a value's type are
//! checked from the same pass.

use crate::expr::{infer, member_table_of, resolve_move_source, BodyCx};
use crate::flow::{FlowState, InvalidationKind, Loc};
use crate::functions::BoundFunction;
use linchk_ast::{Block, CallArg, Expr, Place, Stmt, TransferOperator, Variability};
use linchk_binder::{resolve_type, SymbolTable, TypeResolveCx};
use linchk_common::limits::MAX_RESOURCE_TRACKER_FIXPOINT_ITERATIONS;
use linchk_common::{DiagnosticCollector, DiagnosticKind, Location, ProgramId};
use linchk_solver::{Primitive, TypeData, TypeId, TypeRegistry};
use rustc_hash::FxHashMap;

/// Checks one bound function/initializer/method body end to end.
pub fn check_function(
    registry: &mut TypeRegistry,
    symbols: &SymbolTable,
    diagnostics: &mut DiagnosticCollector,
    program: &ProgramId,
    globals: &FxHashMap<String, TypeId>,
    bound: &BoundFunction,
) {
    let _span = tracing::debug_span!("check_function", name = %bound.name).entered();
    let mut locals: FxHashMap<String, TypeId> = FxHashMap::default();
    let mut flow = FlowState::new();
    let mut resource_params: Vec<Loc> = Vec::new();

    for param in &bound.signature.params {
        locals.insert(param.name.clone(), param.ty);
        if registry.is_resource_type(param.ty) {
            let loc = Loc::Local(param.name.clone());
            flow.declare(loc.clone());
            resource_params.push(loc);
        }
    }
    if let Some(self_ty) = bound.self_type {
        if let Some(table) = member_table_of(registry, self_ty) {
            for member in table.iter() {
                if member.is_field() && registry.is_resource_type(member.ty) {
                    flow.declare(Loc::SelfField(member.name.clone()));
                }
            }
        }
    }

    let mut cx = BodyCx {
        registry,
        symbols,
        diagnostics,
        program,
        scope: bound.scope,
        self_type: bound.self_type,
        locals: &mut locals,
        globals,
        expected_return: bound.signature.return_ty,
        in_initializer: bound.name == "init",
    };
    let exit_flow = check_block(&mut cx, &bound.body, flow);

    // §4.7/§8: a resource-typed parameter must be invalidated on every path
    // through the body, exactly like a resource declared inside it.
    for loc in resource_params {
        if !exit_flow.state(&loc).is_invalidated() {
            cx.diagnostics.report(
                DiagnosticKind::ResourceLossError,
                "this resource-typed parameter goes out of scope without being moved or destroyed on every path".to_string(),
                Location::new(cx.program.clone(), bound.span),
            );
        }
    }
}

fn place_loc(place: &Place) -> Option<Loc> {
    match place {
        Place::Identifier(name, _) => Some(Loc::Local(name.clone())),
        Place::SelfField { field, .. } => Some(Loc::SelfField(field.clone())),
        Place::Member { .. } | Place::Index { .. } => None,
    }
}

fn place_type(cx: &mut BodyCx, place: &Place) -> TypeId {
    match place {
        Place::Identifier(name, span) => match cx.locals.get(name) {
            Some(&ty) => ty,
            None => {
                cx.diagnostics.report(
                    DiagnosticKind::NotDeclaredError,
                    format!("cannot find '{name}' in this scope"),
                    Location::new(cx.program.clone(), *span),
                );
                cx.registry.intern_primitive(Primitive::AnyStruct)
            }
        },
        Place::SelfField { field, span } => {
            let member = cx.self_type.and_then(|t| member_table_of(cx.registry, t)).and_then(|t| t.get(field));
            match member {
                Some(m) => m.ty,
                None => {
                    cx.diagnostics.report(
                        DiagnosticKind::NotDeclaredMemberError,
                        format!("'{field}' is not a member of this type"),
                        Location::new(cx.program.clone(), *span),
                    );
                    cx.registry.intern_primitive(Primitive::AnyStruct)
                }
            }
        }
        Place::Member { receiver, member, span } => {
            let receiver_ty = infer(cx, receiver, false);
            match member_table_of(cx.registry, receiver_ty).and_then(|t| t.get(member)) {
                Some(m) => m.ty,
                None => {
                    cx.diagnostics.report(
                        DiagnosticKind::NotDeclaredMemberError,
                        format!("'{member}' is not a member of this type"),
                        Location::new(cx.program.clone(), *span),
                    );
                    cx.registry.intern_primitive(Primitive::AnyStruct)
                }
            }
        }
        Place::Index { receiver, index, .. } => {
            let receiver_ty = infer(cx, receiver, false);
            let _ = infer(cx, index, false);
            match cx.registry.get(receiver_ty).clone() {
                TypeData::Array(elem) => elem,
                TypeData::Dictionary { value, .. } => value,
                _ => cx.registry.intern_primitive(Primitive::AnyStruct),
            }
        }
    }
}

/// The variability a write through `place` must satisfy, when it is known
/// (member writes only; local variables are checked by `Variability` at
/// `VarDecl` time, not here).
fn place_variability(cx: &BodyCx, place: &Place) -> Option<Variability> {
    match place {
        Place::SelfField { field, .. } => cx.self_type.and_then(|t| member_table_of(cx.registry, t)).and_then(|t| t.get(field)).and_then(|m| m.variability()),
        Place::Member { .. } => None,
        Place::Identifier(_, _) | Place::Index { .. } => None,
    }
}

/// Which diagnostic a transfer-operator mismatch yields depends on where
/// the value sits: a variable declaration or assignment reports the
/// general `IncorrectTransferOperationError`, while a `return` or a call
/// argument reports the more specific missing-move/invalid-move pair.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransferContext {
    Declaration,
    ReturnOrArgument,
}

/// Applies the write side of a move/copy: checks the written transfer
/// operator against the value's default transfer, and if the source is a
/// trackable location, invalidates it (flagging reuse of an already
/// invalidated resource).
fn apply_transfer_in(cx: &mut BodyCx, value: &linchk_ast::Expr, value_ty: TypeId, flow: &mut FlowState, context: TransferContext) {
    if matches!(value.unwrap_transfer(), linchk_ast::Expr::SelfExpr(_)) && value.written_transfer() == TransferOperator::Move {
        cx.diagnostics.report(
            DiagnosticKind::InvalidSelfInvalidationError,
            "`self` cannot be moved inside a member body".to_string(),
            Location::new(cx.program.clone(), value.span()),
        );
    }
    let written = value.written_transfer();
    let expected = cx.registry.default_transfer(value_ty);
    if written != expected {
        let kind = match context {
            TransferContext::Declaration => DiagnosticKind::IncorrectTransferOperationError,
            TransferContext::ReturnOrArgument => {
                if expected == TransferOperator::Move {
                    DiagnosticKind::MissingMoveOperationError
                } else {
                    DiagnosticKind::InvalidMoveOperationError
                }
            }
        };
        cx.diagnostics.report(
            kind,
            format!(
                "expected a `{}` here, found `{}`",
                if expected == TransferOperator::Move { "<-" } else { "=" },
                if written == TransferOperator::Move { "<-" } else { "=" }
            ),
            Location::new(cx.program.clone(), value.span()),
        );
    }
    if written == TransferOperator::Move {
        if let Some(loc) = resolve_move_source(value) {
            let previous = flow.invalidate(loc, InvalidationKind::Moved, value.span());
            if previous.is_invalidated() {
                cx.diagnostics.report(
                    DiagnosticKind::ResourceUseAfterInvalidationError,
                    "this value was already moved or destroyed".to_string(),
                    Location::new(cx.program.clone(), value.span()),
                );
            }
        } else if matches!(value.unwrap_transfer(), linchk_ast::Expr::MemberAccess { .. }) {
            cx.diagnostics.report(
                DiagnosticKind::InvalidNestedResourceMoveError,
                "a resource nested more than one member deep cannot be moved directly".to_string(),
                Location::new(cx.program.clone(), value.span()),
            );
        }
    }
    invalidate_call_args(cx, value, flow);
}

/// Shorthand for the common case: a variable declaration or assignment,
/// where a mismatch reports the general `IncorrectTransferOperationError`.
fn apply_transfer(cx: &mut BodyCx, value: &linchk_ast::Expr, value_ty: TypeId, flow: &mut FlowState) {
    apply_transfer_in(cx, value, value_ty, flow, TransferContext::Declaration);
}

/// `infer`'s recursive walk over a call's arguments has no flow access
/// (expr.rs stays flow-free by design), so a moved argument's source is
/// invalidated here instead, from statement position where `flow` is
/// threaded through. Only reaches one level deep into `value` — a call or
/// create expression sitting directly in a declaration, assignment,
/// return, or expression-statement position, which is every position a
/// statement exposes `flow` at.
fn invalidate_call_args(cx: &mut BodyCx, value: &Expr, flow: &mut FlowState) {
    let args: &[CallArg] = match value.unwrap_transfer() {
        Expr::Call { args, .. } | Expr::Create { args, .. } => args,
        _ => return,
    };
    for arg in args {
        if arg.value.written_transfer() != TransferOperator::Move {
            continue;
        }
        if let Some(loc) = resolve_move_source(&arg.value) {
            let previous = flow.invalidate(loc, InvalidationKind::Moved, arg.value.span());
            if previous.is_invalidated() {
                cx.diagnostics.report(
                    DiagnosticKind::ResourceUseAfterInvalidationError,
                    "this value was already moved or destroyed".to_string(),
                    Location::new(cx.program.clone(), arg.value.span()),
                );
            }
        }
    }
}

/// Walks a block's statements in order, threading `flow` through each one.
/// Tracks which resource-typed locals were declared directly in this block
/// so it can flag any still `Valid` at the end as lost.
fn check_block(cx: &mut BodyCx, block: &Block, mut flow: FlowState) -> FlowState {
    let mut declared_here: Vec<(Loc, linchk_common::Span)> = Vec::new();
    let mut reachable = true;

    for stmt in &block.statements {
        if !reachable {
            cx.diagnostics.report(
                DiagnosticKind::UnreachableStatementError,
                "this statement is unreachable".to_string(),
                Location::new(cx.program.clone(), stmt.span()),
            );
            break;
        }
        match stmt {
            Stmt::VarDecl(v) => {
                let value_ty = infer(cx, &v.value, false);
                let declared_ty = match &v.declared_ty {
                    Some(annotation) => {
                        let mut type_cx = TypeResolveCx {
                            registry: cx.registry,
                            symbols: cx.symbols,
                            diagnostics: cx.diagnostics,
                            program: cx.program.clone(),
                        };
                        let resolved = resolve_type(&mut type_cx, cx.scope, annotation);
                        if !cx.registry.is_subtype(value_ty, resolved) {
                            cx.diagnostics.report(
                                DiagnosticKind::TypeMismatchError,
                                "initializer value does not match the declared type".to_string(),
                                Location::new(cx.program.clone(), v.span),
                            );
                        }
                        let is_resource = cx.registry.is_resource_type(resolved);
                        if is_resource && !v.is_resource_annotated {
                            cx.diagnostics.report(
                                DiagnosticKind::MissingResourceAnnotationError,
                                "a resource-typed variable must be declared with the `@` resource annotation".to_string(),
                                Location::new(cx.program.clone(), v.span),
                            );
                        } else if !is_resource && v.is_resource_annotated {
                            cx.diagnostics.report(
                                DiagnosticKind::InvalidResourceAnnotationError,
                                "the `@` resource annotation is only valid on a resource-typed variable".to_string(),
                                Location::new(cx.program.clone(), v.span),
                            );
                        }
                        resolved
                    }
                    None => value_ty,
                };
                apply_transfer(cx, &v.value, value_ty, &mut flow);
                cx.locals.insert(v.name.clone(), declared_ty);
                if cx.registry.is_resource_type(declared_ty) {
                    let loc = Loc::Local(v.name.clone());
                    flow.declare(loc.clone());
                    declared_here.push((loc, v.span));
                }
            }
            Stmt::Assignment { place, value, span } => {
                let value_ty = infer(cx, value, false);
                if let Some(Variability::Let) = place_variability(cx, place) {
                    if !cx.in_initializer {
                        cx.diagnostics.report(
                            DiagnosticKind::AssignmentToConstantMemberError,
                            "cannot assign to a `let` member outside its initializer".to_string(),
                            Location::new(cx.program.clone(), *span),
                        );
                    }
                }
                let target_ty = place_type(cx, place);
                if !cx.registry.is_subtype(value_ty, target_ty) {
                    cx.diagnostics.report(
                        DiagnosticKind::TypeMismatchError,
                        "assigned value does not match the target's type".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                }
                if let Some(loc) = place_loc(place) {
                    if cx.registry.is_resource_type(target_ty) && flow.state(&loc).is_valid() {
                        cx.diagnostics.report(
                            DiagnosticKind::InvalidResourceAssignmentError,
                            "this assignment overwrites a resource that was never moved or destroyed".to_string(),
                            Location::new(cx.program.clone(), *span),
                        );
                    }
                }
                apply_transfer(cx, value, value_ty, &mut flow);
                if let Some(loc) = place_loc(place) {
                    if cx.registry.is_resource_type(target_ty) {
                        flow.declare(loc);
                    }
                }
            }
            Stmt::Swap { left, right, span } => {
                let left_ty = place_type(cx, left);
                let right_ty = place_type(cx, right);
                let left_loc = place_loc(left);
                let right_loc = place_loc(right);
                let resource_swap = cx.registry.is_resource_type(left_ty) || cx.registry.is_resource_type(right_ty);
                if resource_swap
                    && !cx.in_initializer
                    && (matches!(place_variability(cx, left), Some(Variability::Let)) || matches!(place_variability(cx, right), Some(Variability::Let)))
                {
                    cx.diagnostics.report(
                        DiagnosticKind::AssignmentToConstantMemberError,
                        "a resource field of a `let`-bound composite cannot be swapped".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                }
                if resource_swap && (left_loc.is_none() || right_loc.is_none()) {
                    cx.diagnostics.report(
                        DiagnosticKind::InvalidSwapExpressionError,
                        "a resource can only be swapped between directly addressable locations".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                }
                if !cx.registry.is_subtype(left_ty, right_ty) && !cx.registry.is_subtype(right_ty, left_ty) {
                    cx.diagnostics.report(
                        DiagnosticKind::TypeMismatchError,
                        "swapped locations must hold the same type".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                }
            }
            Stmt::ExprStmt(e) => {
                infer(cx, e, false);
                invalidate_call_args(cx, e, &mut flow);
            }
            Stmt::Return { value, span } => {
                let return_ty = match value {
                    Some(expr) => {
                        let ty = infer(cx, expr, false);
                        apply_transfer_in(cx, expr, ty, &mut flow, TransferContext::ReturnOrArgument);
                        ty
                    }
                    None => cx.registry.intern_primitive(Primitive::Void),
                };
                if !cx.registry.is_subtype(return_ty, cx.expected_return) {
                    cx.diagnostics.report(
                        DiagnosticKind::TypeMismatchError,
                        "returned value does not match the declared return type".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                }
                reachable = false;
            }
            Stmt::Break(_) | Stmt::Continue(_) => {
                reachable = false;
            }
            Stmt::Destroy { value, span } => {
                if matches!(value, linchk_ast::Expr::SelfExpr(_)) {
                    cx.diagnostics.report(
                        DiagnosticKind::InvalidSelfInvalidationError,
                        "`self` cannot be destroyed inside a member body".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                }
                let value_ty = infer(cx, value, false);
                if !cx.registry.is_resource_type(value_ty) {
                    cx.diagnostics.report(
                        DiagnosticKind::InvalidDestructionError,
                        "`destroy` requires a resource-typed value".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                }
                if let Some(loc) = resolve_move_source(value) {
                    let previous = flow.invalidate(loc, InvalidationKind::Destroyed, *span);
                    if previous.is_invalidated() {
                        cx.diagnostics.report(
                            DiagnosticKind::ResourceUseAfterInvalidationError,
                            "this value was already moved or destroyed".to_string(),
                            Location::new(cx.program.clone(), *span),
                        );
                    }
                }
            }
            Stmt::If(i) => {
                infer(cx, &i.condition, false);
                let then_end = check_block(cx, &i.then_block, flow.clone());
                let else_end = match &i.else_ {
                    Some(else_stmt) => check_one(cx, else_stmt, flow.clone()),
                    None => flow.clone(),
                };
                flow = FlowState::merge(&[then_end, else_end]);
            }
            Stmt::IfLet(binding) => {
                flow = check_if_let(cx, binding, flow);
            }
            Stmt::While(w) => {
                flow = check_while(cx, w, flow);
            }
            Stmt::Switch(s) => {
                infer(cx, &s.subject, false);
                let mut branch_ends = Vec::new();
                let mut has_default = false;
                for case in &s.cases {
                    if let Some(pattern) = &case.pattern {
                        infer(cx, pattern, false);
                    } else {
                        has_default = true;
                    }
                    branch_ends.push(check_block(cx, &case.body, flow.clone()));
                }
                if !has_default {
                    branch_ends.push(flow.clone());
                }
                flow = FlowState::merge(&branch_ends);
            }
            Stmt::Block(b) => {
                flow = check_block(cx, b, flow.clone());
            }
        }
    }

    for (loc, span) in declared_here {
        if !flow.state(&loc).is_invalidated() {
            cx.diagnostics.report(
                DiagnosticKind::ResourceLossError,
                "this resource goes out of scope without being moved or destroyed on every path".to_string(),
                Location::new(cx.program.clone(), span),
            );
        }
    }
    flow
}

/// `else`/single-statement bodies of an `if` that aren't a `Block` (an
/// `else if`, most commonly) still need the same fork/merge treatment.
fn check_one(cx: &mut BodyCx, stmt: &Stmt, flow: FlowState) -> FlowState {
    check_block(cx, &Block { statements: vec![stmt.clone()] }, flow)
}

fn check_if_let(cx: &mut BodyCx, binding: &linchk_ast::IfLetBinding, flow: FlowState) -> FlowState {
    let mut then_flow = flow.clone();
    let value_ty = infer(cx, &binding.value, true);
    let inner_ty = match cx.registry.get(value_ty) {
        TypeData::Optional(inner) => *inner,
        _ => value_ty,
    };
    let source_loc = resolve_move_source(binding.value.unwrap_transfer());
    let is_resource = cx.registry.is_resource_type(inner_ty);

    if is_resource {
        if let Some(loc) = source_loc.clone() {
            then_flow.invalidate(loc, InvalidationKind::Moved, binding.span);
        }
        then_flow.declare(Loc::Local(binding.name.clone()));
    }
    cx.locals.insert(binding.name.clone(), inner_ty);
    let then_end = check_block(cx, &binding.then_block, then_flow);

    // The downcast having failed means the original value was never taken;
    // the `else` branch sees it untouched, not invalidated.
    let else_end = match &binding.else_block {
        Some(block) => check_block(cx, block, flow.clone()),
        None => flow,
    };

    FlowState::merge(&[then_end, else_end])
}

fn check_while(cx: &mut BodyCx, w: &linchk_ast::WhileStmt, flow: FlowState) -> FlowState {
    let mut probe = flow.clone();
    for _ in 0..MAX_RESOURCE_TRACKER_FIXPOINT_ITERATIONS {
        let mut scratch = DiagnosticCollector::new();
        let mut probe_locals = cx.locals.clone();
        let mut probe_cx = BodyCx {
            registry: cx.registry,
            symbols: cx.symbols,
            diagnostics: &mut scratch,
            program: cx.program,
            scope: cx.scope,
            self_type: cx.self_type,
            locals: &mut probe_locals,
            globals: cx.globals,
            expected_return: cx.expected_return,
            in_initializer: cx.in_initializer,
        };
        infer(&mut probe_cx, &w.condition, false);
        let iterated = check_block(&mut probe_cx, &w.body, probe.clone());
        let merged = FlowState::merge(&[probe.clone(), iterated]);
        let stable = merged.states_equal(&probe);
        probe = merged;
        if stable {
            break;
        }
    }

    infer(cx, &w.condition, false);
    let body_end = check_block(cx, &w.body, probe.clone());
    FlowState::merge(&[probe, body_end])
}
