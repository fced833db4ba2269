use serde::{Deserialize, Serialize};

use crate::qualifier::QualKind;

/// Operand layout class, fixed by the primary opcode field (bits 31:26).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    Unknown,
    PalCall,
    Branch,
    Memory,
    MemoryBranch,
    MemoryFormatCompute,
    Operate,
    FloatingPoint,
}

macro_rules! opcodes {
    ($($name:ident => $mn:literal,)*) => {
        /// Every mnemonic the decoder can produce.
        ///
        /// Floating-point operates that carry rounding/trap qualifiers decode to
        /// their base mnemonic; the qualifier is derived from the function field
        /// at render time (see [`crate::qualifier`]).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Opcode {
            $($name,)*
        }

        impl Opcode {
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name,)*];

            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => $mn,)*
                }
            }
        }
    };
}

opcodes! {
    Unknown => "???",

    // PAL and reserved primary opcodes
    CallPal => "call_pal",
    Opc01 => "opc01",
    Opc02 => "opc02",
    Opc03 => "opc03",
    Opc04 => "opc04",
    Opc05 => "opc05",
    Opc06 => "opc06",
    Opc07 => "opc07",
    Pal19 => "pal19",
    Pal1b => "pal1b",
    Pal1d => "pal1d",
    Pal1e => "pal1e",
    Pal1f => "pal1f",

    // Memory format
    Lda => "lda",
    Ldah => "ldah",
    Ldbu => "ldbu",
    LdqU => "ldq_u",
    Ldwu => "ldwu",
    Stw => "stw",
    Stb => "stb",
    StqU => "stq_u",
    Ldf => "ldf",
    Ldg => "ldg",
    Lds => "lds",
    Ldt => "ldt",
    Stf => "stf",
    Stg => "stg",
    Sts => "sts",
    Stt => "stt",
    Ldl => "ldl",
    Ldq => "ldq",
    LdlL => "ldl_l",
    LdqL => "ldq_l",
    Stl => "stl",
    Stq => "stq",
    StlC => "stl_c",
    StqC => "stq_c",

    // 0x10 integer arithmetic
    Addl => "addl",
    S4addl => "s4addl",
    Subl => "subl",
    S4subl => "s4subl",
    Cmpbge => "cmpbge",
    S8addl => "s8addl",
    S8subl => "s8subl",
    Cmpult => "cmpult",
    Addq => "addq",
    S4addq => "s4addq",
    Subq => "subq",
    S4subq => "s4subq",
    Cmpeq => "cmpeq",
    S8addq => "s8addq",
    S8subq => "s8subq",
    Cmpule => "cmpule",
    AddlV => "addl/v",
    SublV => "subl/v",
    Cmplt => "cmplt",
    AddqV => "addq/v",
    SubqV => "subq/v",
    Cmple => "cmple",

    // 0x11 logical and conditional move
    And => "and",
    Bic => "bic",
    Cmovlbs => "cmovlbs",
    Cmovlbc => "cmovlbc",
    Bis => "bis",
    Cmoveq => "cmoveq",
    Cmovne => "cmovne",
    Ornot => "ornot",
    Xor => "xor",
    Cmovlt => "cmovlt",
    Cmovge => "cmovge",
    Eqv => "eqv",
    Amask => "amask",
    Cmovle => "cmovle",
    Cmovgt => "cmovgt",
    Implver => "implver",

    // 0x12 shifts and byte manipulation
    Mskbl => "mskbl",
    Extbl => "extbl",
    Insbl => "insbl",
    Mskwl => "mskwl",
    Extwl => "extwl",
    Inswl => "inswl",
    Mskll => "mskll",
    Extll => "extll",
    Insll => "insll",
    Zap => "zap",
    Zapnot => "zapnot",
    Mskql => "mskql",
    Srl => "srl",
    Extql => "extql",
    Sll => "sll",
    Insql => "insql",
    Sra => "sra",
    Mskwh => "mskwh",
    Inswh => "inswh",
    Extwh => "extwh",
    Msklh => "msklh",
    Inslh => "inslh",
    Extlh => "extlh",
    Mskqh => "mskqh",
    Insqh => "insqh",
    Extqh => "extqh",

    // 0x13 multiply
    Mull => "mull",
    Mulq => "mulq",
    Umulh => "umulh",
    MullV => "mull/v",
    MulqV => "mulq/v",

    // 0x14 integer-to-float moves and square roots
    Itofs => "itofs",
    Itoff => "itoff",
    Itoft => "itoft",
    Sqrtf => "sqrtf",
    Sqrts => "sqrts",
    Sqrtg => "sqrtg",
    Sqrtt => "sqrtt",

    // 0x15 VAX floating point
    CvtqfC => "cvtqf/c",
    CvtqgC => "cvtqg/c",
    Cmpgeq => "cmpgeq",
    Cmpglt => "cmpglt",
    Cmpgle => "cmpgle",
    Cvtqf => "cvtqf",
    Cvtqg => "cvtqg",
    CmpgeqS => "cmpgeq/s",
    CmpgltS => "cmpglt/s",
    CmpgleS => "cmpgle/s",
    Addf => "addf",
    Subf => "subf",
    Mulf => "mulf",
    Divf => "divf",
    Cvtdg => "cvtdg",
    Addg => "addg",
    Subg => "subg",
    Mulg => "mulg",
    Divg => "divg",
    Cvtgf => "cvtgf",
    Cvtgd => "cvtgd",
    Cvtgq => "cvtgq",

    // 0x16 IEEE floating point
    Cmptun => "cmptun",
    Cmpteq => "cmpteq",
    Cmptlt => "cmptlt",
    Cmptle => "cmptle",
    Cvtst => "cvtst",
    CmptunSu => "cmptun/su",
    CmpteqSu => "cmpteq/su",
    CmptltSu => "cmptlt/su",
    CmptleSu => "cmptle/su",
    CvtstS => "cvtst/s",
    Adds => "adds",
    Subs => "subs",
    Muls => "muls",
    Divs => "divs",
    Addt => "addt",
    Subt => "subt",
    Mult => "mult",
    Divt => "divt",
    Cvtts => "cvtts",
    Cvttq => "cvttq",
    Cvtqs => "cvtqs",
    Cvtqt => "cvtqt",

    // 0x17 floating-point miscellany
    Cvtlq => "cvtlq",
    Cpys => "cpys",
    Cpysn => "cpysn",
    Cpyse => "cpyse",
    MtFpcr => "mt_fpcr",
    MfFpcr => "mf_fpcr",
    Fcmoveq => "fcmoveq",
    Fcmovne => "fcmovne",
    Fcmovlt => "fcmovlt",
    Fcmovge => "fcmovge",
    Fcmovle => "fcmovle",
    Fcmovgt => "fcmovgt",
    Cvtql => "cvtql",
    CvtqlV => "cvtql/v",
    CvtqlSv => "cvtql/sv",

    // 0x18 barriers and cache control
    Trapb => "trapb",
    Excb => "excb",
    Mb => "mb",
    Wmb => "wmb",
    Fetch => "fetch",
    FetchM => "fetch_m",
    Rpcc => "rpcc",
    Rc => "rc",
    Rs => "rs",
    Ecb => "ecb",
    Wh64 => "wh64",
    Wh64en => "wh64en",

    // 0x1a register-indirect jumps
    Jmp => "jmp",
    Jsr => "jsr",
    Ret => "ret",
    JsrCoroutine => "jsr_coroutine",

    // 0x1c extensions
    Sextb => "sextb",
    Sextw => "sextw",
    Ctpop => "ctpop",
    Perr => "perr",
    Ctlz => "ctlz",
    Cttz => "cttz",
    Unpkbw => "unpkbw",
    Unpkbl => "unpkbl",
    Pkwb => "pkwb",
    Pklb => "pklb",
    Minsb8 => "minsb8",
    Minsw4 => "minsw4",
    Minub8 => "minub8",
    Minuw4 => "minuw4",
    Maxub8 => "maxub8",
    Maxuw4 => "maxuw4",
    Maxsb8 => "maxsb8",
    Maxsw4 => "maxsw4",
    Ftoit => "ftoit",
    Ftois => "ftois",

    // Branch format
    Br => "br",
    Fbeq => "fbeq",
    Fblt => "fblt",
    Fble => "fble",
    Bsr => "bsr",
    Fbne => "fbne",
    Fbge => "fbge",
    Fbgt => "fbgt",
    Blbc => "blbc",
    Beq => "beq",
    Blt => "blt",
    Ble => "ble",
    Blbs => "blbs",
    Bne => "bne",
    Bge => "bge",
    Bgt => "bgt",
}

impl Opcode {
    /// Qualifier family of floating operates whose mnemonic takes a `/xx`
    /// suffix derived from the function field.
    pub const fn qualifier_kind(self) -> Option<QualKind> {
        use Opcode::*;
        match self {
            Sqrts | Sqrtt | Adds | Subs | Muls | Divs | Addt | Subt | Mult | Divt | Cvtts => {
                Some(QualKind::Ieee)
            }
            Cvtqs | Cvtqt => Some(QualKind::IntToFloat),
            Cvttq => Some(QualKind::FloatToInt),
            Sqrtf | Sqrtg | Addf | Subf | Mulf | Divf | Cvtdg | Addg | Subg | Mulg | Divg
            | Cvtgf | Cvtgd => Some(QualKind::Vax),
            Cvtgq => Some(QualKind::VaxToInt),
            _ => None,
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

use Format::*;

/// Format of each primary opcode, indexed by bits 31:26.
pub const FORMATS: [Format; 64] = [
    // 0x00
    PalCall, Unknown, Unknown, Unknown, Unknown, Unknown, Unknown, Unknown,
    // 0x08
    Memory, Memory, Memory, Memory, Memory, Memory, Memory, Memory,
    // 0x10
    Operate, Operate, Operate, Operate, FloatingPoint, FloatingPoint, FloatingPoint, FloatingPoint,
    // 0x18
    MemoryFormatCompute, Unknown, MemoryBranch, Unknown, Operate, Unknown, Unknown, Unknown,
    // 0x20
    Memory, Memory, Memory, Memory, Memory, Memory, Memory, Memory,
    // 0x28
    Memory, Memory, Memory, Memory, Memory, Memory, Memory, Memory,
    // 0x30
    Branch, Branch, Branch, Branch, Branch, Branch, Branch, Branch,
    // 0x38
    Branch, Branch, Branch, Branch, Branch, Branch, Branch, Branch,
];
