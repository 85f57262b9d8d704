//! Call-order tests for wrapped methods.
//!
//! These tests mirror how packages use the engine in practice: classes with
//! prototype methods, wrappers stacked on them, and code that keeps
//! reassigning the same slots by hand.

extern crate libwrapper;


use std::cell::Cell;
use std::rc::Rc;

use call_order::{num, prototype, set_method, CallOrderChecker, Harness};
use libwrapper::host::{
    get, get_property, new_instance, set_property, split_next, HostFunction, HostValue,
    PropertyKey,
};

// ============================================================================
// Basic functionality
// ============================================================================

mod basic_tests {
    use super::*;

    #[test]
    fn test_wrappers_and_manual_reassignment() {
        let h = Harness::new();
        let chkr = CallOrderChecker::new();

        let class_a = h.define_class("A", None);
        set_method(&class_a, "x", chkr.gen_fn("A:Orig"));
        let proto_a = prototype(&class_a);

        let a = new_instance(&class_a).unwrap();
        chkr.check(&a, "x", &["A:Orig"], "a.Orig");

        h.wrap_front("A.prototype.x", chkr.gen_wr("A:1"));
        chkr.check(&a, "x", &["A:1", "A:Orig"], "a.A:1");

        h.wrap_front("A.prototype.x", chkr.gen_wr("A:2"));
        chkr.check(&a, "x", &["A:2", "A:1", "A:Orig"], "a.A:2");

        // Manual wrapper
        set_property(&proto_a, "x", chkr.gen_fn("Man:A:1")).unwrap();
        chkr.check(&a, "x", &["A:2", "A:1", "Man:A:1"], "a.Man:A:1");

        h.wrap_front("A.prototype.x", chkr.gen_wr("A:3"));
        chkr.check(&a, "x", &["A:3", "A:2", "A:1", "Man:A:1"], "a.A:3");

        set_property(&proto_a, "x", chkr.gen_fn("Man:A:2")).unwrap();
        chkr.check(&a, "x", &["A:3", "A:2", "A:1", "Man:A:2"], "a.Man:A:2");

        // The traditional way: keep the current value, then replace it.
        let wrapped = get_property(&proto_a, "x").unwrap();
        set_property(&proto_a, "x", chkr.gen_fn_calling("Man:A:3", wrapped)).unwrap();
        chkr.check(
            &a,
            "x",
            &["A:3", "A:2", "A:1", "Man:A:3", "Man:A:2"],
            "a.Man:A:3",
        );

        h.wrap_front("A.prototype.x", chkr.gen_wr("A:4"));
        chkr.check(
            &a,
            "x",
            &["A:4", "A:3", "A:2", "A:1", "Man:A:3", "Man:A:2"],
            "a.A:4",
        );
    }

    #[test]
    fn test_arguments_and_return_values() {
        let h = Harness::new();
        let class_a = h.define_class("A", None);
        set_method(
            &class_a,
            "x",
            HostFunction::new("x", |_, args| Ok(HostValue::from(num(&args[0]) + num(&args[1])))),
        );
        let a = new_instance(&class_a).unwrap();
        let call = |y: f64, z: f64| {
            let result = libwrapper::host::call_method(&a, "x", vec![y.into(), z.into()]).unwrap();
            num(&result)
        };

        assert_eq!(call(0.0, 1.0), 1.0);
        assert_eq!(call(1.0, 1.0), 2.0);

        // next(...args)
        let check1 = Rc::new(Cell::new(0.0));
        let c1 = check1.clone();
        h.wrap_front(
            "A.prototype.x",
            HostFunction::new("w1", move |_, args| {
                let (next, args) = split_next(args)?;
                let inner = next.call(&HostValue::Undefined, args.clone())?;
                assert_eq!(num(&inner), c1.get(), "xWrapper 1");
                Ok(HostValue::from(num(&args[0]) - num(&args[1])))
            }),
        );
        check1.set(5.0);
        assert_eq!(call(3.0, 2.0), 1.0);
        check1.set(20.0);
        assert_eq!(call(10.0, 10.0), 0.0);

        // next.call(this, args)
        let check2 = Rc::new(Cell::new(0.0));
        let c2 = check2.clone();
        h.wrap_front(
            "A.prototype.x",
            HostFunction::new("w2", move |this, args| {
                let (next, args) = split_next(args)?;
                let inner = next.call(this, args.clone())?;
                assert_eq!(num(&inner), c2.get(), "xWrapper 2");
                Ok(HostValue::from(num(&args[0]) * num(&args[1])))
            }),
        );
        check1.set(15.0);
        check2.set(5.0);
        assert_eq!(call(10.0, 5.0), 50.0);
        check1.set(6.0);
        check2.set(-2.0);
        assert_eq!(call(2.0, 4.0), 8.0);

        let check3 = Rc::new(Cell::new(0.0));
        let c3 = check3.clone();
        h.wrap_front(
            "A.prototype.x",
            HostFunction::new("w3", move |this, args| {
                let (next, args) = split_next(args)?;
                let inner = next.call(this, args.clone())?;
                assert_eq!(num(&inner), c3.get(), "xWrapper 3");
                Ok(HostValue::from((num(&args[0]) / num(&args[1])).floor()))
            }),
        );
        check1.set(6.0);
        check2.set(0.0);
        check3.set(9.0);
        assert_eq!(call(3.0, 3.0), 1.0);
        check1.set(15.0);
        check2.set(1.0);
        check3.set(56.0);
        assert_eq!(call(8.0, 7.0), 1.0);
    }
}

// ============================================================================
// Instance assignment
// ============================================================================

mod instance_tests {
    use super::*;

    #[test]
    fn test_assignment_to_instance_after_wrapping_prototype() {
        let h = Harness::new();
        let chkr = CallOrderChecker::new();

        let class_a = h.define_class("A", None);
        set_method(&class_a, "x", chkr.gen_fn("A:Orig"));

        let a = new_instance(&class_a).unwrap();
        chkr.check(&a, "x", &["A:Orig"], "a.Orig");

        h.wrap_front("A.prototype.x", chkr.gen_wr("A:1"));
        chkr.check(&a, "x", &["A:1", "A:Orig"], "a.A:1");

        // Assign to a, not to A.prototype
        set_property(&a, "x", chkr.gen_fn("a:1")).unwrap();
        chkr.check(&a, "x", &["A:1", "a:1"], "a.a:1");

        // Other instances keep the prototype's original.
        let b = new_instance(&class_a).unwrap();
        chkr.check(&b, "x", &["A:1", "A:Orig"], "b.Orig");

        let wrapped = get_property(&b, "x").unwrap();
        set_property(&b, "x", chkr.gen_fn_calling("Man:b:1", wrapped)).unwrap();
        chkr.check(&b, "x", &["A:1", "Man:b:1", "A:Orig"], "b.Man:b:1");
    }

    #[test]
    fn test_unwrap_turns_instance_assignment_into_own_property() {
        let h = Harness::new();
        let chkr = CallOrderChecker::new();

        let class_a = h.define_class("A", None);
        set_method(&class_a, "x", chkr.gen_fn("A:Orig"));
        let a = new_instance(&class_a).unwrap();

        h.wrap_front("A.prototype.x", chkr.gen_wr("A:1"));
        set_property(&a, "x", chkr.gen_fn("a:1")).unwrap();
        assert!(!a.borrow().has_own_property(&PropertyKey::from("x")));

        h.lib.unwrap_all();
        assert!(a.borrow().has_own_property(&PropertyKey::from("x")));
        chkr.check(&a, "x", &["a:1"], "a.a:1 unwrapped");

        let b = new_instance(&class_a).unwrap();
        chkr.check(&b, "x", &["A:Orig"], "b.Orig unwrapped");
    }
}

// ============================================================================
// Inherited methods
// ============================================================================

mod inherited_tests {
    use super::*;

    #[test]
    fn test_wrapping_inherited_methods() {
        let h = Harness::new();
        let chkr = CallOrderChecker::new();

        let class_a = h.define_class("A", None);
        set_method(&class_a, "x", chkr.gen_fn("A:Orig"));
        let proto_a = prototype(&class_a);

        let class_b = h.define_class("B", Some(&class_a));
        let class_c = h.define_class("C", Some(&class_a));
        let class_d = h.define_class("D", Some(&class_a));
        let class_e = h.define_class("E", Some(&class_d));
        set_method(&class_e, "x", chkr.gen_fn("E:Orig"));

        // class F extends A { x(...args) { return gen_fn('F:Orig', super.x).apply(this, args); } }
        let class_f = h.define_class("F", Some(&class_a));
        {
            let chkr = chkr.clone();
            let proto_a = proto_a.clone();
            set_method(
                &class_f,
                "x",
                HostFunction::new("x", move |this, args| {
                    let sup = get(&proto_a, &PropertyKey::from("x"), this)?;
                    chkr.push("F:Orig");
                    sup.call(this, args)
                }),
            );
        }

        let a = new_instance(&class_a).unwrap();
        chkr.check(&a, "x", &["A:Orig"], "a.Orig");

        let b = new_instance(&class_b).unwrap();
        chkr.check(&b, "x", &["A:Orig"], "b.Orig");

        h.wrap_front("B.prototype.x", chkr.gen_wr("B:1"));
        chkr.check(&b, "x", &["B:1", "A:Orig"], "b.B:1");

        set_property(&b, "x", chkr.gen_fn("b:1")).unwrap();
        chkr.check(&b, "x", &["B:1", "b:1"], "b.b:1");

        let wrapped = get_property(&b, "x").unwrap();
        set_property(&b, "x", chkr.gen_fn_calling("Man:b:1", wrapped)).unwrap();
        chkr.check(&b, "x", &["B:1", "Man:b:1", "b:1"], "b.Man:b:1");

        let b2 = new_instance(&class_b).unwrap();
        chkr.check(&b2, "x", &["B:1", "A:Orig"], "b2.Orig");

        let c = new_instance(&class_c).unwrap();
        chkr.check(&c, "x", &["A:Orig"], "c.Orig");

        h.wrap_front("C.prototype.x", chkr.gen_wr("C:1"));
        chkr.check(&c, "x", &["C:1", "A:Orig"], "c.C:1");

        h.wrap_front("A.prototype.x", chkr.gen_wr("A:1"));
        chkr.check(&a, "x", &["A:1", "A:Orig"], "a.A:1");
        chkr.check(&b2, "x", &["B:1", "A:1", "A:Orig"], "b2.A:1");
        chkr.check(&c, "x", &["C:1", "A:1", "A:Orig"], "c.A:1");

        let e = new_instance(&class_e).unwrap();
        chkr.check(&e, "x", &["E:Orig"], "e.Orig");

        // Inherited wrappers run before the descendant's own original once the
        // descendant is wrapped as well.
        h.wrap_front("E.prototype.x", chkr.gen_wr("E:1"));
        chkr.check(&e, "x", &["E:1", "A:1", "E:Orig"], "e.E:1");

        let f = new_instance(&class_f).unwrap();
        chkr.check(&f, "x", &["F:Orig", "A:1", "A:Orig"], "f.Orig");

        h.wrap_front("F.prototype.x", chkr.gen_wr("F:1"));
        chkr.check(&f, "x", &["F:1", "A:1", "F:Orig", "A:Orig"], "f.F:1");
    }

    #[test]
    fn test_recursive_call_runs_full_chain() {
        let h = Harness::new();
        let chkr = CallOrderChecker::new();

        let class_a = h.define_class("A", None);
        {
            let chkr = chkr.clone();
            set_method(
                &class_a,
                "count",
                HostFunction::new("count", move |this, args| {
                    chkr.push("A:Orig");
                    let n = num(&args[0]);
                    if n <= 0.0 {
                        return Ok(HostValue::from(0.0));
                    }
                    let this_obj = this.as_object().unwrap().clone();
                    let rest = libwrapper::host::call_method(&this_obj, "count", vec![(n - 1.0).into()])?;
                    Ok(HostValue::from(num(&rest) + 1.0))
                }),
            );
        }
        h.wrap_front("A.prototype.count", chkr.gen_wr("A:1"));

        let a = new_instance(&class_a).unwrap();
        let result = libwrapper::host::call_method(&a, "count", vec![2.0.into()]).unwrap();
        assert_eq!(num(&result), 2.0);
        // Re-entering the slot from the original goes through the chain again.
        pretty_assertions::assert_eq!(
            chkr.take(),
            vec!["A:1", "A:Orig", "A:1", "A:Orig", "A:1", "A:Orig"]
        );
    }
}
