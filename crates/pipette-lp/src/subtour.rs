// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Cycle extraction for lazy subtour elimination.

/// Splits a successor permutation into its cycles, each starting at its
/// smallest node. Cycles are returned in order of their smallest node.
///
/// `successor[i]` is the node visited after `i`. On a map that is not a
/// permutation (a solve cut short) each walk stops at the first visited node.
pub fn cycles(successor: &[usize]) -> Vec<Vec<usize>> {
    let mut visited = vec![false; successor.len()];
    let mut result = Vec::new();
    for start in 0..successor.len() {
        if visited[start] {
            continue;
        }
        let mut cycle = Vec::new();
        let mut node = start;
        while !visited[node] {
            visited[node] = true;
            cycle.push(node);
            node = successor[node];
        }
        result.push(cycle);
    }
    result
}
