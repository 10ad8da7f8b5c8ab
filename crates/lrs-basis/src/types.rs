use slotmap::new_key_type;

// Arena keys for the function/element/line support graph. The refinement
// driver owns the SlotMap arenas; entities hold keys, never references.

new_key_type! {
    pub struct FunctionId;
    pub struct ElementId;
    pub struct MeshLineId;
}
