//! The built-in corpus of Eightebed programs, exercised by `ebedc --test`.
//!
//! Each case is a complete program with an expected front-end outcome:
//! accepted, or rejected with a particular error kind. The suite runs the
//! front end only (parse → type check → safety analysis), so it is
//! deterministic and needs no C toolchain.

use crate::driver;

pub enum Expect {
    Accept,
    /// Rejected with this [`crate::CompileError::kind`] tag.
    Reject(&'static str),
}

pub struct Case {
    pub name: &'static str,
    pub source: &'static str,
    pub expect: Expect,
}

pub struct Outcome {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

pub const CASES: &[Case] = &[
    Case {
        name: "simple_ok",
        source: "var int jim; { jim = 4; }",
        expect: Expect::Accept,
    },
    Case {
        name: "simple_arith",
        source: r#"
{
    if (((3 * 3) = (10 - 1)) & (4 > 3)) {
        print ((4 + 8) / 3);
    }
}
"#,
        expect: Expect::Accept,
    },
    Case {
        name: "double_declaration",
        source: r#"
var int jim;
var ptr to node jim;
{
    print 3;
}
"#,
        expect: Expect::Reject("name"),
    },
    Case {
        name: "ptr_to_ptr",
        source: r#"
type node struct {
    int value;
    ptr to ptr to node next;
};
var node jim;
{
    print [jim].value;
}
"#,
        expect: Expect::Reject("type"),
    },
    Case {
        name: "ptr_to_int",
        source: r#"
var ptr to int kelly;
{
    if valid kelly { print @kelly; }
}
"#,
        expect: Expect::Reject("type"),
    },
    Case {
        name: "struct_within_struct",
        source: r#"
type kooba struct {
    int value;
    struct {
        int whirlygig;
    } barnard;
};
var kooba jim;
{
    print [jim].value;
}
"#,
        expect: Expect::Reject("type"),
    },
    Case {
        name: "named_int",
        source: r#"
type kooba int;
var kooba jim;
{
    print jim;
}
"#,
        expect: Expect::Reject("type"),
    },
    Case {
        name: "dereference_outside_conditional",
        source: r#"
type node struct {
    int value;
    ptr to node next;
};
var ptr to node jim;
{
    jim = malloc node;
    print [@jim].value;
    free jim;
}
"#,
        expect: Expect::Reject("safety"),
    },
    Case {
        name: "dereference_outside_safe_area",
        source: r#"
type node struct {
    int value;
    ptr to node next;
};
var ptr to node jim;
var ptr to node murray;
{
    jim = malloc node;
    if valid jim {
        jim = murray;
        print [@jim].value;
    }
    free jim;
}
"#,
        expect: Expect::Reject("safety"),
    },
    Case {
        name: "dereference_after_free",
        source: r#"
type node struct {
    int value;
    ptr to node next;
};
var ptr to node jim;
var ptr to node donald;
{
    jim = malloc node;
    donald = jim;
    if valid jim {
        free donald;
        print [@jim].value;
    }
}
"#,
        expect: Expect::Reject("safety"),
    },
    Case {
        name: "dereference_within_nested_safe_area",
        source: r#"
type node struct {
    int value;
    ptr to node next;
};
var ptr to node jim;
{
    jim = malloc node;
    if valid jim {
        [@jim].next = malloc node;
    }
    if valid jim {
        if valid [@jim].next {
            print [@jim].value;
        }
    }
    free jim;
}
"#,
        expect: Expect::Accept,
    },
    Case {
        name: "allocated_values_initialized",
        source: r#"
type node struct {
    int value;
    ptr to node next;
};
var ptr to node jim;
var ptr to node nestor;
{
    jim = malloc node;
    if valid jim {
        print [@jim].value;
        nestor = [@jim].next;
        if valid nestor {
            print 99;
        }
    }
    free jim;
}
"#,
        expect: Expect::Accept,
    },
    Case {
        name: "loop_1",
        source: r#"
var int i;
{
    i = 5;
    while i {
        print i;
        i = (i - 1);
    }
}
"#,
        expect: Expect::Accept,
    },
    Case {
        name: "allocating_loop",
        source: r#"
type node struct {
    int value;
    ptr to node next;
};
var ptr to node jim;
var ptr to node harry;
var int i;
{
    jim = malloc node;
    harry = jim;
    i = 100;
    while i {
        harry = malloc node;
        if valid jim {
            [@jim].value = i;
        }
        if valid jim {
            [@jim].next = harry;
            if valid harry {
                jim = harry;
            }
        }
        i = (i - 1);
    }
}
"#,
        expect: Expect::Accept,
    },
    Case {
        name: "free_invalidates",
        source: r#"
type node struct {
    int value;
    ptr to node next;
};
var ptr to node jim;
{
    jim = malloc node;
    if valid jim {
        free jim;
    }
    if valid jim {
        print 42;
    }
    print 53;
}
"#,
        expect: Expect::Accept,
    },
    Case {
        name: "alias_is_invalidated",
        source: r#"
type node struct {
    int value;
    ptr to node next;
};
var ptr to node jim;
var ptr to node harry;
var ptr to node bertie;
var ptr to node albert;
var int i;
{
    albert = malloc node;
    jim = albert;
    harry = jim;
    i = 100;
    while i {
        harry = malloc node;
        if valid jim {
            [@jim].value = i;
        }
        if (i = 87) {
            bertie = jim;
        }
        if valid jim {
            [@jim].next = harry;
            if valid harry {
                jim = harry;
            }
        }
        i = (i - 1);
    }
    free bertie;
    jim = albert;
    while valid jim {
        if valid jim {
            print [@jim].value;
            jim = [@jim].next;
        }
    }
}
"#,
        expect: Expect::Accept,
    },
    Case {
        name: "allocate_and_free_loop",
        source: r#"
type node struct {
    int value;
    ptr to node next;
};
var ptr to node fred;
var ptr to node george;
var int i;
{
    i = 100;
    while i {
        fred = malloc node;
        if valid fred {
            [@fred].value = i;
        }
        if (i = 50) {
            george = fred;
        } else {
            free fred;
        }
        i = (i - 1);
    }
    if valid george {
        print [@george].value;
    }
}
"#,
        expect: Expect::Accept,
    },
];

/// Run every case through the front end and report.
pub fn run() -> Vec<Outcome> {
    CASES
        .iter()
        .map(|case| {
            let result = driver::parse_and_check(case.source);
            let (passed, detail) = match (&case.expect, &result) {
                (Expect::Accept, Ok(_)) => (true, "accepted".to_string()),
                (Expect::Accept, Err(err)) => (false, format!("unexpected error: {err}")),
                (Expect::Reject(kind), Err(err)) if err.kind() == *kind => {
                    (true, format!("rejected: {err}"))
                }
                (Expect::Reject(kind), Err(err)) => {
                    (false, format!("wrong error kind (wanted {kind}): {err}"))
                }
                (Expect::Reject(kind), Ok(_)) => {
                    (false, format!("accepted, expected a {kind} error"))
                }
            };
            Outcome {
                name: case.name,
                passed,
                detail,
            }
        })
        .collect()
}
