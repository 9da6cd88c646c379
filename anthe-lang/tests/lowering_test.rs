use anthe_lang::interner::ToSymbol;
use anthe_lang::ir::blockgen::generate_basic_blocks;
use anthe_lang::ir::transform::{clean, flatten};
use anthe_lang::ir::verify::verify_module;
use anthe_lang::ir::{BinOp, Cmd, Module, Value};
use anthe_lang::types::Type;
use anthe_lang::utils::metadata::Location;
use anthe_lang::{function_t, integer_t, string_t};

fn loc() -> Location {
    Location::new(0..0, "sum.an".to_symbol())
}

#[test]
fn counted_sum_survives_the_whole_pipeline() {
    let mut module = Module::new();
    let f_typ = function_t!(vec![integer_t!()], vec![integer_t!()]).into_id();
    let f = module.add_function(loc(), "sum".to_symbol(), f_typ);
    module.add_exported_function(f);
    module.loc_id_of_exports = Some(1);

    let func = module.function_mut(f);
    let n = func.add_local(Some("n".to_symbol()), integer_t!().into_id());
    let acc = func.add_local(Some("acc".to_symbol()), integer_t!().into_id());
    let i = func.add_local(Some("i".to_symbol()), integer_t!().into_id());
    assert_eq!(func.arg_var(1), n);

    // The frontend leaves Nops behind; clean must wipe them before the
    // tree is lowered.
    func.body = Some(Cmd::Seq {
        cmds: vec![
            Cmd::Move {
                loc: loc(),
                dst: acc,
                src: Value::Integer(0),
            },
            Cmd::Seq {
                cmds: vec![
                    Cmd::Nop,
                    Cmd::For {
                        loc: loc(),
                        dst: i,
                        src_start: Value::Integer(1),
                        src_limit: Value::LocalVar(n),
                        src_step: Value::Integer(1),
                        body: Box::new(Cmd::Seq {
                            cmds: vec![
                                Cmd::Binop {
                                    loc: loc(),
                                    dst: acc,
                                    op: BinOp::IntAdd,
                                    src1: Value::LocalVar(acc),
                                    src2: Value::LocalVar(i),
                                },
                                Cmd::CheckGC,
                            ],
                        }),
                    },
                ],
            },
            Cmd::Return {
                loc: loc(),
                srcs: vec![Value::LocalVar(acc)],
            },
        ],
    });

    let body = module.function_mut(f).body.as_mut().unwrap();
    clean(body);
    assert!(flatten(body).iter().all(|c| !matches!(c, Cmd::Nop)));

    generate_basic_blocks(&mut module);
    verify_module(&module).expect("lowered module must verify");

    let func = module.function(f);
    let blocks = func.blocks.as_ref().unwrap();
    // Entry falls into the expansion, the expansion allocated its five
    // temporaries, and some block carries the zero-step error.
    assert_eq!(func.vars.len(), 8);
    assert!(blocks.len() > 3);
    assert!(blocks.iter().any(|b| {
        b.cmds.iter().any(|c| matches!(
            c,
            Cmd::RuntimeError { msg, .. } if msg == "'for' step is zero"
        ))
    }));

    let printed = module.to_string();
    assert!(printed.contains("fn sum"));
    assert!(printed.contains("exported functions: f1"));
}

#[test]
fn closures_name_themselves_before_their_upvalues() {
    let mut module = Module::new();

    let inner_typ = function_t!(vec![], vec![integer_t!()]).into_id();
    let inner = module.add_function(loc(), "get".to_symbol(), inner_typ);
    let outer_typ = function_t!(vec![integer_t!()], vec![integer_t!()]).into_id();
    let outer = module.add_function(loc(), "make".to_symbol(), outer_typ);

    {
        let func = module.function_mut(inner);
        let u = func.add_upvalue(Some("n".to_symbol()), integer_t!().into_id());
        func.f_id_of_upvalue.insert(u, outer);
        func.body = Some(Cmd::Return {
            loc: loc(),
            srcs: vec![Value::Upvalue(u)],
        });
    }

    {
        let func = module.function_mut(outer);
        let n = func.add_local(Some("n".to_symbol()), integer_t!().into_id());
        let cls = func.add_local(Some("get".to_symbol()), inner_typ);
        let ret = func.add_local(None, integer_t!().into_id());
        func.f_id_of_local.insert(n, inner);
        func.body = Some(Cmd::Seq {
            cmds: vec![
                Cmd::NewClosure {
                    loc: loc(),
                    dst: cls,
                    f_id: inner,
                },
                // The closure is already named, so it may capture itself.
                Cmd::InitUpvalues {
                    loc: loc(),
                    src_f: Value::LocalVar(cls),
                    srcs: vec![Value::LocalVar(n)],
                    f_id: inner,
                },
                Cmd::CheckGC,
                Cmd::CallStatic {
                    loc: loc(),
                    f_typ: inner_typ,
                    dsts: vec![Some(ret)],
                    src_f: Value::LocalVar(cls),
                    srcs: vec![],
                },
                Cmd::Return {
                    loc: loc(),
                    srcs: vec![Value::LocalVar(ret)],
                },
            ],
        });
    }

    generate_basic_blocks(&mut module);
    verify_module(&module).expect("closure module must verify");

    let blocks = module.function(outer).blocks.as_ref().unwrap();
    let tags: Vec<&str> = blocks
        .iter()
        .flat_map(|b| b.cmds.iter().map(Cmd::tag))
        .collect();
    assert_eq!(
        tags,
        vec![
            "ir.Cmd.NewClosure",
            "ir.Cmd.InitUpvalues",
            "ir.Cmd.CheckGC",
            "ir.Cmd.CallStatic",
            "ir.Cmd.Return",
        ]
    );
}

#[test]
fn dynamic_and_builtin_commands_lower_as_straight_lines() {
    let mut module = Module::new();
    let f_typ = function_t!(vec![string_t!()], vec![]).into_id();
    let f = module.add_function(loc(), "greet".to_symbol(), f_typ);

    let func = module.function_mut(f);
    let name = func.add_local(Some("name".to_symbol()), string_t!().into_id());
    let msg = func.add_local(None, string_t!().into_id());
    func.body = Some(Cmd::Seq {
        cmds: vec![
            Cmd::Concat {
                loc: loc(),
                dst: msg,
                srcs: vec![
                    Value::String("hello ".to_symbol()),
                    Value::LocalVar(name),
                    Value::String("\n".to_symbol()),
                ],
            },
            Cmd::BuiltinIoWrite {
                loc: loc(),
                dsts: vec![],
                srcs: vec![Value::LocalVar(msg)],
            },
            Cmd::Return {
                loc: loc(),
                srcs: vec![],
            },
        ],
    });

    generate_basic_blocks(&mut module);
    verify_module(&module).expect("builtin module must verify");

    // Straight-line code stays in one body block between entry and exit.
    let blocks = module.function(f).blocks.as_ref().unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[1].cmds.len(), 3);
    assert!(blocks[1].next.is_none());
}
