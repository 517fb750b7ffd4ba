//! SSA value and block representation (spec §3.5).

use crate::ast::Span;
use crate::types::TypeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Plain,
    If,
    Ret,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    ConstInt,
    ConstFloat,
    ConstBool,
    ConstNil,
    ConstString,

    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// Pointer + scaled-integer.
    AddPtr,
    /// Pointer - scaled-integer.
    SubPtr,

    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    And,
    Or,
    Xor,
    Shl,
    Shr,
    Not,

    SignExt,
    ZeroExt,
    Trunc,

    Load,
    Store,
    /// Bulk copy of `aux_int` bytes, used for large (>16B) struct parameters
    /// and aggregate assignment (spec §4.5.2 phase 3).
    Move,

    LocalAddr,
    GlobalAddr,
    /// Constant byte offset from a pointer argument.
    OffPtr,
    Addr,

    SliceMake,
    SlicePtr,
    SliceLen,

    StringMake,
    StringConcat,

    StaticCall,
    ClosureCall,

    Arg,
    CondSelect,

    /// Placeholder created while a local's value is read before its
    /// definition is known (spec §4.5.4). Never survives construction.
    FwdRef,
    /// Block-head merge value. `args.len()` must equal the block's
    /// predecessor count, positions corresponding 1-to-1 (spec §3.5).
    Phi,
    /// A forward reference resolved to a single unique definition.
    Copy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Aux {
    None,
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub id: ValueId,
    pub op: Op,
    pub ty: TypeIndex,
    pub block: BlockId,
    pub args: Vec<ValueId>,
    pub aux_int: i64,
    pub aux: Aux,
    pub pos: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub values: Vec<ValueId>,
    pub predecessors: Vec<BlockId>,
    pub successors: Vec<BlockId>,
    /// `controls[0]` is required for `if` blocks, optional for `ret`,
    /// absent elsewhere (spec §3.5).
    pub controls: Vec<ValueId>,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Block {
            id,
            kind,
            values: Vec::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            controls: Vec::new(),
        }
    }
}

/// One function's SSA form: the output of [`crate::ssa::SsaBuilder::build`].
#[derive(Debug, Clone)]
pub struct Func {
    pub name: String,
    pub return_type: TypeIndex,
    pub blocks: Vec<Block>,
    values: Vec<Value>,
}

impl Func {
    pub fn new(name: impl Into<String>, return_type: TypeIndex) -> Self {
        Func {
            name: name.into(),
            return_type,
            blocks: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn new_block(&mut self, kind: BlockKind) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block::new(id, kind));
        id
    }

    /// Allocate the next value id without yet attaching it to a block;
    /// used by the forward-reference algorithm, which must mint a
    /// placeholder id before it knows the full argument list.
    fn next_id(&self) -> ValueId {
        ValueId(self.values.len() as u32)
    }

    pub fn push_value(&mut self, block: BlockId, op: Op, ty: TypeIndex, args: Vec<ValueId>, pos: Span) -> ValueId {
        let id = self.next_id();
        self.values.push(Value {
            id,
            op,
            ty,
            block,
            args,
            aux_int: 0,
            aux: Aux::None,
            pos,
        });
        self.blocks[block.0 as usize].values.push(id);
        id
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0 as usize]
    }

    pub fn value_mut(&mut self, id: ValueId) -> &mut Value {
        &mut self.values[id.0 as usize]
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn all_values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Reorder `block` so every `phi` precedes every non-`phi` value (spec
    /// §4.5.5: phis may have been appended mid-list during φ lookup).
    pub fn reorder_phis_first(&mut self, block: BlockId) {
        let ids = self.blocks[block.0 as usize].values.clone();
        let (mut phis, mut rest): (Vec<ValueId>, Vec<ValueId>) =
            (Vec::new(), Vec::new());
        for id in ids {
            if self.value(id).op == Op::Phi {
                phis.push(id);
            } else {
                rest.push(id);
            }
        }
        phis.append(&mut rest);
        self.blocks[block.0 as usize].values = phis;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_ids_are_sequential() {
        let mut f = Func::new("f", TypeIndex::VOID);
        let a = f.new_block(BlockKind::Plain);
        let b = f.new_block(BlockKind::Ret);
        assert_eq!(a.0, 0);
        assert_eq!(b.0, 1);
    }

    #[test]
    fn push_value_ids_are_monotonic() {
        let mut f = Func::new("f", TypeIndex::I64);
        let b = f.new_block(BlockKind::Ret);
        let v1 = f.push_value(b, Op::ConstInt, TypeIndex::I64, Vec::new(), Span::default());
        let v2 = f.push_value(b, Op::ConstInt, TypeIndex::I64, Vec::new(), Span::default());
        assert_eq!(v1.0, 0);
        assert_eq!(v2.0, 1);
        assert_eq!(f.blocks[b.0 as usize].values, vec![v1, v2]);
    }

    #[test]
    fn reorder_phis_first_moves_phis_to_front() {
        let mut f = Func::new("f", TypeIndex::I64);
        let b = f.new_block(BlockKind::Plain);
        let c = f.push_value(b, Op::ConstInt, TypeIndex::I64, Vec::new(), Span::default());
        let phi = f.push_value(b, Op::Phi, TypeIndex::I64, Vec::new(), Span::default());
        assert_eq!(f.blocks[b.0 as usize].values, vec![c, phi]);
        f.reorder_phis_first(b);
        assert_eq!(f.blocks[b.0 as usize].values, vec![phi, c]);
    }
}
