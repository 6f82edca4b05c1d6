//! Core bootstrap table.
//!
//! Signatures of the built-in methods every unit can call, installed into a
//! fresh [`ClassRegistry`] before it is sealed. Overloads are declared in
//! the order the matcher should try them.
//!
//! # Module Structure
//!
//! - `array`: folds for `Array` and `Array()`
//! - `numeric`: folds for `Integer` and `Float` operators
//! - `object`: folds for `Object`, `Class`, `String`, `Symbol`, `NilClass`

mod array;
mod numeric;
mod object;

use quack_ir::{Name, StringInterner};
use quack_types::{
    BlockSig, Callable, ClassId, ClassRegistry, DuckAccumulator, FoldFn, MethodBody, MethodKind,
    Param, RegistryError, Ty,
};

/// Install the core methods into `registry`.
///
/// # Errors
/// A [`RegistryError`] if the registry is already sealed.
pub fn install(registry: &mut ClassRegistry, interner: &StringInterner) -> Result<(), RegistryError> {
    let mut core = Core { registry, interner };
    core.object()?;
    core.class()?;
    core.numeric(ClassId::INTEGER)?;
    core.numeric(ClassId::FLOAT)?;
    core.text()?;
    core.array()?;
    tracing::debug!(classes = core.registry.class_count(), "core installed");
    Ok(())
}

fn class(id: ClassId) -> Ty {
    Ty::Class(id)
}

fn boolean() -> Ty {
    Ty::union([class(ClassId::TRUE), class(ClassId::FALSE)])
}

/// One unnamed parameter of type `ty`.
fn arg(ty: Ty) -> Param {
    Param::required(Name::EMPTY, ty)
}

struct Core<'a> {
    registry: &'a mut ClassRegistry,
    interner: &'a StringInterner,
}

impl Core<'_> {
    fn def(
        &mut self,
        owner: ClassId,
        name: &str,
        sig: Callable,
        fold: Option<FoldFn>,
    ) -> Result<(), RegistryError> {
        let name = self.interner.intern(name);
        self.registry
            .define_method(owner, MethodKind::Instance, name, sig, MethodBody::Builtin(fold))
            .map(drop)
    }

    fn object(&mut self) -> Result<(), RegistryError> {
        let any = Ty::Any;
        self.registry.define_method(
            ClassId::BASIC_OBJECT,
            MethodKind::Class,
            Name::NEW,
            Callable::returning(Ty::SelfType).param(Param::rest(Name::EMPTY, any.clone())),
            MethodBody::Allocate,
        )?;
        self.def(
            ClassId::BASIC_OBJECT,
            "initialize",
            Callable::returning(class(ClassId::NIL)),
            None,
        )?;

        let bool_op = || Callable::returning(boolean()).param(arg(Ty::Any));
        self.def(ClassId::BASIC_OBJECT, "==", bool_op(), Some(object::eq))?;
        self.def(ClassId::BASIC_OBJECT, "!=", bool_op(), Some(object::not_eq))?;
        self.def(ClassId::BASIC_OBJECT, "equal?", bool_op(), Some(object::eq))?;
        self.def(
            ClassId::BASIC_OBJECT,
            "!",
            Callable::returning(boolean()),
            Some(object::not),
        )?;
        self.def(ClassId::OBJECT, "===", bool_op(), Some(object::eq))?;
        self.def(
            ClassId::OBJECT,
            "nil?",
            Callable::returning(boolean()),
            Some(object::is_nil),
        )?;
        self.def(
            ClassId::OBJECT,
            "class",
            Callable::returning(class(ClassId::CLASS)),
            Some(object::class),
        )?;
        self.def(ClassId::OBJECT, "itself", Callable::returning(Ty::SelfType), None)?;
        self.def(
            ClassId::OBJECT,
            "to_s",
            Callable::returning(class(ClassId::STRING)),
            None,
        )?;
        self.def(
            ClassId::OBJECT,
            "puts",
            Callable::returning(class(ClassId::NIL)).param(Param::rest(Name::EMPTY, any.clone())),
            None,
        )?;

        // tap { |self| ... } -> self
        self.def(
            ClassId::OBJECT,
            "tap",
            Callable::returning(Ty::SelfType).with_block(BlockSig {
                params: vec![Ty::SelfType],
                ret: any,
                required: true,
            }),
            None,
        )?;

        // then { |self| -> T } -> T
        let t = self.registry.fresh_type_var();
        self.def(
            ClassId::OBJECT,
            "then",
            Callable::returning(Ty::Var(t))
                .with_block(BlockSig {
                    params: vec![Ty::SelfType],
                    ret: Ty::Var(t),
                    required: true,
                })
                .generic([t]),
            None,
        )?;

        // String(x: #<Duck to_s: () -> T>) -> T
        let t = self.registry.fresh_type_var();
        let printable = DuckAccumulator::new()
            .require(Name::TO_S, Callable::returning(Ty::Var(t)))
            .finish();
        self.def(
            ClassId::OBJECT,
            "String",
            Callable::returning(Ty::Var(t)).param(arg(printable)).generic([t]),
            None,
        )?;

        // Array(x: T) -> Array[T]
        let t = self.registry.fresh_type_var();
        self.def(
            ClassId::OBJECT,
            "Array",
            Callable::returning(Ty::Generic(ClassId::ARRAY, vec![Ty::Var(t)]))
                .param(arg(Ty::Var(t)))
                .generic([t]),
            Some(array::wrap),
        )?;

        self.def(
            ClassId::NIL,
            "to_s",
            Callable::returning(class(ClassId::STRING)),
            Some(object::nil_to_s),
        )?;
        self.def(
            ClassId::NIL,
            "to_a",
            Callable::returning(Ty::Generic(ClassId::ARRAY, vec![class(ClassId::NIL)])),
            Some(array::nil_to_a),
        )
    }

    fn class(&mut self) -> Result<(), RegistryError> {
        self.def(
            ClassId::CLASS,
            "===",
            Callable::returning(boolean()).param(arg(Ty::Any)),
            Some(object::class_case_eq),
        )?;
        self.def(
            ClassId::CLASS,
            "name",
            Callable::returning(class(ClassId::STRING)),
            Some(object::class_name),
        )
    }

    /// Operators of `Integer` or `Float`, each overloaded on an `Integer`
    /// and a `Float` argument.
    fn numeric(&mut self, owner: ClassId) -> Result<(), RegistryError> {
        let arith: [(&str, FoldFn); 4] = [
            ("+", numeric::add),
            ("-", numeric::sub),
            ("*", numeric::mul),
            ("/", numeric::div),
        ];
        for (name, fold) in arith {
            let int_result = if owner == ClassId::INTEGER {
                ClassId::INTEGER
            } else {
                ClassId::FLOAT
            };
            self.def(
                owner,
                name,
                Callable::returning(class(int_result)).param(arg(class(ClassId::INTEGER))),
                Some(fold),
            )?;
            self.def(
                owner,
                name,
                Callable::returning(class(ClassId::FLOAT)).param(arg(class(ClassId::FLOAT))),
                Some(fold),
            )?;
        }

        let comparisons: [(&str, FoldFn); 4] = [
            ("<", numeric::lt),
            (">", numeric::gt),
            ("<=", numeric::le),
            (">=", numeric::ge),
        ];
        for (name, fold) in comparisons {
            self.def(
                owner,
                name,
                Callable::returning(boolean()).param(arg(class(ClassId::NUMERIC))),
                Some(fold),
            )?;
        }

        let (to_i, to_f): (Option<FoldFn>, Option<FoldFn>) = if owner == ClassId::INTEGER {
            (None, Some(numeric::to_f))
        } else {
            (Some(numeric::to_i), None)
        };
        let same = |target: ClassId| {
            if target == owner {
                Ty::SelfType
            } else {
                class(target)
            }
        };
        self.def(owner, "to_i", Callable::returning(same(ClassId::INTEGER)), to_i)?;
        self.def(owner, "to_f", Callable::returning(same(ClassId::FLOAT)), to_f)?;
        self.def(
            owner,
            "to_s",
            Callable::returning(class(ClassId::STRING)),
            Some(numeric::to_s),
        )
    }

    fn text(&mut self) -> Result<(), RegistryError> {
        let string = class(ClassId::STRING);
        self.def(
            ClassId::STRING,
            "+",
            Callable::returning(string.clone()).param(arg(string.clone())),
            Some(object::string_plus),
        )?;
        self.def(
            ClassId::STRING,
            "length",
            Callable::returning(class(ClassId::INTEGER)),
            Some(object::string_length),
        )?;
        self.def(ClassId::STRING, "to_s", Callable::returning(Ty::SelfType), None)?;
        self.def(
            ClassId::SYMBOL,
            "to_s",
            Callable::returning(string),
            Some(object::symbol_to_s),
        )
    }

    fn array(&mut self) -> Result<(), RegistryError> {
        let array_ty = class(ClassId::ARRAY);
        for name in ["length", "size"] {
            self.def(
                ClassId::ARRAY,
                name,
                Callable::returning(class(ClassId::INTEGER)),
                Some(array::length),
            )?;
        }
        self.def(ClassId::ARRAY, "first", Callable::returning(Ty::Any), Some(array::first))?;
        self.def(
            ClassId::ARRAY,
            "+",
            Callable::returning(array_ty.clone()).param(arg(array_ty)),
            Some(array::plus),
        )?;
        self.def(ClassId::ARRAY, "to_a", Callable::returning(Ty::SelfType), None)
    }
}
