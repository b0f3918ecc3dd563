//! Expression type inference and the expression-level rules of §4.6 that
//! don't depend on flow state: construction, member access, method
//! binding, container literals, and casts.

use crate::flow::Loc;
use linchk_ast::{BinaryOp, CastKind, Expr, Literal, UnaryOp};
use linchk_binder::{resolve_path, resolve_type, ScopeId, SymbolTable, TypeResolveCx};
use linchk_common::{DiagnosticCollector, DiagnosticKind, Location, ProgramId};
use linchk_solver::{MemberKind, Primitive, TypeData, TypeId, TypeRegistry};
use rustc_hash::FxHashMap;

/// Everything the expression checker needs to resolve names and report
/// diagnostics while walking a single function/initializer body.
pub struct BodyCx<'a> {
    pub registry: &'a mut TypeRegistry,
    pub symbols: &'a SymbolTable,
    pub diagnostics: &'a mut DiagnosticCollector,
    pub program: &'a ProgramId,
    pub scope: ScopeId,
    pub self_type: Option<TypeId>,
    pub locals: &'a mut FxHashMap<String, TypeId>,
    /// Top-level free functions, keyed by name, holding each one's interned
    /// `Function` type — free functions have no symbol-table entry (only
    /// composites/interfaces do), so a bare-identifier call needs this
    /// separate lookup alongside `locals` and `symbols`.
    pub globals: &'a FxHashMap<String, TypeId>,
    /// The enclosing function's declared return type, checked against
    /// every `return` statement's value.
    pub expected_return: TypeId,
    /// `true` only while walking a composite's own `init` body, where
    /// writes to `let` fields are first assignments rather than mutation.
    pub in_initializer: bool,
}

/// If an expression (after stripping the written transfer operator) names
/// a storage location directly, the `Loc` the flow tracker should mutate
/// on a move. Member-access chains through anything other than `self`
/// (e.g. `a.b.c`) are not resolvable to a single tracked location; callers
/// are expected to flag those separately as `InvalidNestedResourceMoveError`.
pub fn resolve_move_source(expr: &Expr) -> Option<Loc> {
    match expr.unwrap_transfer() {
        Expr::Identifier(name, _) => Some(Loc::Local(name.clone())),
        Expr::MemberAccess { receiver, member, .. } => match receiver.as_ref() {
            Expr::SelfExpr(_) => Some(Loc::SelfField(member.clone())),
            _ => None,
        },
        _ => None,
    }
}

/// Checks each call argument's type against the matching parameter type and
/// its written transfer operator against `default_transfer(param_ty)`.
/// Argument counts are allowed to differ (the Member Binder already flags
/// arity mismatches on declared functions; this only checks the overlap) and
/// this does not invalidate move sources, since `infer` has no flow access —
/// a resource argument's own use-after-move is only caught if it is also
/// read elsewhere in the same body.
fn check_call_args(cx: &mut BodyCx, args: &[linchk_ast::CallArg], param_tys: &[TypeId]) {
    for (arg, &param_ty) in args.iter().zip(param_tys) {
        let arg_ty = infer(cx, &arg.value, false);
        if !cx.registry.is_subtype(arg_ty, param_ty) {
            cx.diagnostics.report(
                DiagnosticKind::TypeMismatchError,
                "argument type does not match the parameter's declared type".to_string(),
                Location::new(cx.program.clone(), arg.value.span()),
            );
        }
        let expected = cx.registry.default_transfer(param_ty);
        let written = arg.value.written_transfer();
        if written != expected {
            let kind = if expected == linchk_ast::TransferOperator::Move {
                DiagnosticKind::MissingMoveOperationError
            } else {
                DiagnosticKind::InvalidMoveOperationError
            };
            cx.diagnostics.report(
                kind,
                "argument's transfer operator does not match the parameter's type".to_string(),
                Location::new(cx.program.clone(), arg.value.span()),
            );
        }
    }
    for arg in args.iter().skip(param_tys.len()) {
        infer(cx, &arg.value, false);
    }
}

pub(crate) fn member_table_of<'r>(registry: &'r TypeRegistry, ty: TypeId) -> Option<&'r linchk_solver::MemberTable> {
    if let Some(c) = registry.composite(ty) {
        return Some(&c.members);
    }
    if let Some(i) = registry.interface(ty) {
        return Some(&i.members);
    }
    None
}

/// Infers an expression's type, reporting the construct-level diagnostics
/// of §4.6 along the way. `allow_failable_downcast` is set only by the
/// statement checker while walking the source expression of an
/// `if let x <- e as? @T` binding.
pub fn infer(cx: &mut BodyCx, expr: &Expr, allow_failable_downcast: bool) -> TypeId {
    match expr {
        Expr::Literal(lit, _) => {
            let primitive = match lit {
                Literal::Int(_) => Primitive::Int,
                Literal::Bool(_) => Primitive::Bool,
                Literal::Str(_) => Primitive::String,
                Literal::Void => Primitive::Void,
            };
            cx.registry.intern_primitive(primitive)
        }
        Expr::Identifier(name, span) => match cx.locals.get(name).or_else(|| cx.globals.get(name)) {
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
        Expr::SelfExpr(_) => cx.self_type.unwrap_or_else(|| cx.registry.intern_primitive(Primitive::AnyStruct)),
        Expr::MemberAccess { receiver, member, span } => {
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
        Expr::Index { receiver, index, span } => {
            let receiver_ty = infer(cx, receiver, false);
            let index_ty = infer(cx, index, false);
            match cx.registry.get(receiver_ty).clone() {
                TypeData::Array(elem) => elem,
                TypeData::Dictionary { key, value } => {
                    if !cx.registry.is_subtype(index_ty, key) {
                        cx.diagnostics.report(
                            DiagnosticKind::TypeMismatchError,
                            "index type does not match the dictionary's key type".to_string(),
                            Location::new(cx.program.clone(), *span),
                        );
                    }
                    value
                }
                _ => cx.registry.intern_primitive(Primitive::AnyStruct),
            }
        }
        Expr::Call { callee, args, span } => {
            // A bare `T(args)` call where `T` names a type rather than a
            // local binding is construction syntax, not a function call.
            // Resources must go through `create` instead.
            if let Expr::Identifier(name, _) = callee.as_ref() {
                if !cx.locals.contains_key(name) && !cx.globals.contains_key(name) {
                    if let Some(symbol_id) = cx.symbols.lookup(cx.scope, name) {
                        let type_id = cx.symbols.symbol(symbol_id).type_id;
                        for arg in args {
                            infer(cx, &arg.value, false);
                        }
                        if cx.registry.kind_of(type_id) == Some(linchk_ast::CompositeKind::Resource) {
                            cx.diagnostics.report(
                                DiagnosticKind::MissingCreateError,
                                format!("'{name}' is a resource and must be instantiated with `create`"),
                                Location::new(cx.program.clone(), *span),
                            );
                        }
                        return type_id;
                    }
                }
            }
            let callee_ty = infer(cx, callee, false);
            match cx.registry.get(callee_ty).clone() {
                TypeData::Function { params, ret } => {
                    check_call_args(cx, args, &params);
                    ret
                }
                _ => {
                    for arg in args {
                        infer(cx, &arg.value, false);
                    }
                    cx.diagnostics.report(
                        DiagnosticKind::UnsupportedTypeError,
                        "this expression is not callable".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                    cx.registry.intern_primitive(Primitive::AnyStruct)
                }
            }
        }
        Expr::Create { ty, args, span } => {
            let mut type_cx =
                TypeResolveCx { registry: cx.registry, symbols: cx.symbols, diagnostics: cx.diagnostics, program: cx.program.clone() };
            let Some(type_id) = resolve_path(&mut type_cx, cx.scope, ty) else {
                return cx.registry.intern_primitive(Primitive::AnyStruct);
            };
            match cx.registry.composite(type_id).and_then(|c| c.initializer.clone()) {
                Some(sig) => check_call_args(cx, args, &sig.params.iter().map(|p| p.ty).collect::<Vec<_>>()),
                None => {
                    for arg in args {
                        infer(cx, &arg.value, false);
                    }
                }
            }
            match cx.registry.kind_of(type_id) {
                Some(linchk_ast::CompositeKind::Resource) => type_id,
                Some(_) => {
                    cx.diagnostics.report(
                        DiagnosticKind::InvalidConstructionError,
                        format!("'{}' is not a resource and cannot be created with `create`", ty.qualified()),
                        Location::new(cx.program.clone(), *span),
                    );
                    type_id
                }
                None => type_id,
            }
        }
        Expr::Destroy { value, span } => {
            if matches!(value.as_ref(), Expr::SelfExpr(_)) {
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
            cx.registry.intern_primitive(Primitive::Void)
        }
        Expr::Move { value, span } => {
            if matches!(value.as_ref(), Expr::SelfExpr(_)) {
                cx.diagnostics.report(
                    DiagnosticKind::InvalidSelfInvalidationError,
                    "`self` cannot be moved inside a member body".to_string(),
                    Location::new(cx.program.clone(), *span),
                );
            }
            infer(cx, value, allow_failable_downcast)
        }
        Expr::Bare { value } => infer(cx, value, allow_failable_downcast),
        Expr::Binary { op, left, right, span } => {
            let left_ty = infer(cx, left, false);
            let _ = infer(cx, right, false);
            match op {
                BinaryOp::Eq | BinaryOp::NotEq => {
                    if cx.registry.is_resource_type(left_ty) {
                        cx.diagnostics.report(
                            DiagnosticKind::NotEquatableTypeError,
                            "resource-typed values cannot be compared for equality".to_string(),
                            Location::new(cx.program.clone(), *span),
                        );
                    }
                    cx.registry.intern_primitive(Primitive::Bool)
                }
                BinaryOp::And | BinaryOp::Or | BinaryOp::Less | BinaryOp::Greater => {
                    cx.registry.intern_primitive(Primitive::Bool)
                }
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => left_ty,
            }
        }
        Expr::Unary { op, operand, .. } => {
            let operand_ty = infer(cx, operand, false);
            match op {
                UnaryOp::Not => cx.registry.intern_primitive(Primitive::Bool),
                UnaryOp::Negate => operand_ty,
            }
        }
        Expr::Cast { kind, value, ty, span } => {
            let _ = infer(cx, value, false);
            let mut type_cx =
                TypeResolveCx { registry: cx.registry, symbols: cx.symbols, diagnostics: cx.diagnostics, program: cx.program.clone() };
            let target = resolve_type(&mut type_cx, cx.scope, ty);
            match kind {
                CastKind::Failable => {
                    if !allow_failable_downcast {
                        cx.diagnostics.report(
                            DiagnosticKind::InvalidFailableResourceDowncastOutsideOptionalBindingError,
                            "a failable downcast of a resource value must occur inside an `if let` binding".to_string(),
                            Location::new(cx.program.clone(), *span),
                        );
                    }
                    cx.registry.intern_optional(target)
                }
                CastKind::Static | CastKind::Forced => target,
            }
        }
        Expr::ArrayLiteral { elements, span } => {
            let mut elem_ty = None;
            for element in elements {
                let ty = infer(cx, element, false);
                if cx.registry.is_resource_type(ty) && element.written_transfer() != linchk_ast::TransferOperator::Move {
                    cx.diagnostics.report(
                        DiagnosticKind::InvalidResourceArrayMemberError,
                        "a resource placed in an array literal must be moved".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                }
                elem_ty.get_or_insert(ty);
            }
            let elem_ty = elem_ty.unwrap_or_else(|| cx.registry.intern_primitive(Primitive::AnyStruct));
            cx.registry.intern_array(elem_ty)
        }
        Expr::DictionaryLiteral { entries, span } => {
            let mut key_ty = None;
            let mut value_ty = None;
            for (key, value) in entries {
                let k_ty = infer(cx, key, false);
                let v_ty = infer(cx, value, false);
                if cx.registry.is_resource_type(k_ty) {
                    cx.diagnostics.report(
                        DiagnosticKind::InvalidDictionaryKeyTypeError,
                        "a resource cannot be used as a dictionary key".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                }
                if cx.registry.is_resource_type(v_ty) && value.written_transfer() != linchk_ast::TransferOperator::Move {
                    cx.diagnostics.report(
                        DiagnosticKind::InvalidResourceDictionaryMemberError,
                        "a resource placed in a dictionary literal must be moved".to_string(),
                        Location::new(cx.program.clone(), *span),
                    );
                }
                key_ty.get_or_insert(k_ty);
                value_ty.get_or_insert(v_ty);
            }
            let key_ty = key_ty.unwrap_or_else(|| cx.registry.intern_primitive(Primitive::AnyStruct));
            let value_ty = value_ty.unwrap_or_else(|| cx.registry.intern_primitive(Primitive::AnyStruct));
            cx.registry.intern_dictionary(key_ty, value_ty)
        }
        Expr::MethodBinding { receiver, member, span } => {
            let receiver_ty = infer(cx, receiver, false);
            if matches!(receiver.as_ref(), Expr::SelfExpr(_)) {
                cx.diagnostics.report(
                    DiagnosticKind::InvalidSelfInvalidationError,
                    "`self` cannot be captured by value inside a member body".to_string(),
                    Location::new(cx.program.clone(), *span),
                );
            }
            if cx.registry.is_resource_type(receiver_ty) {
                cx.diagnostics.report(
                    DiagnosticKind::ResourceMethodBindingError,
                    "a resource value's method cannot be captured as a first-class function".to_string(),
                    Location::new(cx.program.clone(), *span),
                );
            }
            match member_table_of(cx.registry, receiver_ty).and_then(|t| t.get(member)) {
                Some(m) if matches!(m.kind, MemberKind::Function { .. }) => m.ty,
                _ => {
                    cx.diagnostics.report(
                        DiagnosticKind::NotDeclaredMemberError,
                        format!("'{member}' is not a member of this type"),
                        Location::new(cx.program.clone(), *span),
                    );
                    cx.registry.intern_primitive(Primitive::AnyStruct)
                }
            }
        }
    }
}
